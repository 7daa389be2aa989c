//! Line-oriented front end driving a [`Session`].

use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};

use crate::app::export::ExportFormat;
use crate::app::session::{Reply, Session, Status, StatusLevel};
use crate::infra::clipboard::ClipboardSink;
use crate::ui::commands::{self, Command, HELP};
use crate::ui::table::{render_rows, render_state};

const PROMPT: &str = "fewshot";
const EDIT_PROMPT: &str = "  .";

/// One read from a line source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    Line(String),
    /// Current input abandoned (Ctrl-C).
    Interrupted,
    /// Input exhausted (Ctrl-D or end of script).
    Closed,
}

/// Where command lines come from.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<LineEvent>;
}

/// Interactive terminal input backed by reedline.
pub struct TerminalSource {
    editor: Reedline,
}

impl TerminalSource {
    pub fn new() -> Self {
        Self {
            editor: Reedline::create(),
        }
    }
}

impl Default for TerminalSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSource for TerminalSource {
    fn read_line(&mut self, prompt: &str) -> Result<LineEvent> {
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(prompt.to_string()),
            DefaultPromptSegment::Empty,
        );
        let event = match self.editor.read_line(&prompt).context("failed to read input")? {
            Signal::Success(line) => LineEvent::Line(line),
            Signal::CtrlC => LineEvent::Interrupted,
            Signal::CtrlD => LineEvent::Closed,
        };
        Ok(event)
    }
}

/// Pre-recorded lines, as read from a script file.
#[derive(Debug, Clone, Default)]
pub struct ScriptSource {
    lines: std::collections::VecDeque<String>,
}

impl ScriptSource {
    pub fn new(contents: &str) -> Self {
        Self {
            lines: contents.lines().map(ToString::to_string).collect(),
        }
    }
}

impl LineSource for ScriptSource {
    fn read_line(&mut self, _prompt: &str) -> Result<LineEvent> {
        Ok(match self.lines.pop_front() {
            Some(line) => LineEvent::Line(line),
            None => LineEvent::Closed,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Summary of a shell run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub commands: usize,
    pub errors: usize,
}

pub struct Shell<W: Write> {
    session: Session,
    clipboard: Box<dyn ClipboardSink>,
    out: W,
    stop_on_error: bool,
}

impl<W: Write> Shell<W> {
    pub fn new(session: Session, clipboard: Box<dyn ClipboardSink>, out: W) -> Self {
        Self {
            session,
            clipboard,
            out,
            stop_on_error: false,
        }
    }

    /// Stop at the first command that reports an error.
    pub fn stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Read and execute commands until the source closes or `quit` is entered.
    pub fn run(&mut self, source: &mut dyn LineSource) -> Result<RunStats> {
        let mut stats = RunStats::default();
        loop {
            let line = match source.read_line(PROMPT)? {
                LineEvent::Line(line) => line,
                LineEvent::Interrupted => continue,
                LineEvent::Closed => break,
            };

            let command = match commands::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(err) => {
                    stats.errors += 1;
                    self.print_status(&Status::error(err.to_string()))?;
                    if self.stop_on_error {
                        break;
                    }
                    continue;
                }
            };

            stats.commands += 1;
            let (flow, failed) = self.execute(command, source)?;
            if failed {
                stats.errors += 1;
            }
            if flow == Flow::Quit || (failed && self.stop_on_error) {
                break;
            }
        }
        self.out.flush().context("failed to flush output")?;
        Ok(stats)
    }

    fn execute(&mut self, command: Command, source: &mut dyn LineSource) -> Result<(Flow, bool)> {
        tracing::debug!(?command, "executing");
        let reply = match command {
            Command::Help => {
                writeln!(self.out, "{HELP}")?;
                return Ok((Flow::Continue, false));
            }
            Command::Show => {
                let state = render_state(self.session.template(), self.session.fields());
                writeln!(self.out, "{state}")?;
                return Ok((Flow::Continue, false));
            }
            Command::List => {
                writeln!(self.out, "{}", render_rows(&self.session.rows()))?;
                return Ok((Flow::Continue, false));
            }
            Command::Quit => return Ok((Flow::Quit, false)),
            Command::Include(sections) => {
                let template = self.session.template().clone().with_sections(sections);
                self.session.apply_template(template)
            }
            Command::Scope(scope) => {
                let template = self.session.template().clone().with_scope(scope);
                self.session.apply_template(template)
            }
            Command::ShowSystem(show) => {
                let template = self.session.template().clone().with_show_system(show);
                self.session.apply_template(template)
            }
            Command::ShowGlobalApis(show) => {
                let template = self.session.template().clone().with_show_global_apis(show);
                self.session.apply_template(template)
            }
            Command::Set(field, value) => self.session.set_field(field, value),
            Command::Clear(field) => self.session.set_field(field, String::new()),
            Command::Edit(field) => match read_block(source)? {
                Some(value) => self.session.set_field(field, value),
                None => {
                    self.print_status(&Status::info(format!("Edit of {field} cancelled.")))?;
                    return Ok((Flow::Continue, false));
                }
            },
            Command::Load(field, path) => match fs::read_to_string(&path) {
                Ok(value) => self.session.set_field(field, value),
                Err(err) => {
                    let status =
                        Status::error(format!("failed to read {}: {err}", path.display()));
                    self.print_status(&status)?;
                    return Ok((Flow::Continue, true));
                }
            },
            Command::Reset => self.session.reset_fields(),
            Command::Preview => self.session.preview(),
            Command::Copy => self.session.copy_preview(self.clipboard.as_mut()),
            Command::Add => {
                let reply = self.session.add_example();
                self.print_reply(&reply)?;
                if !reply.status.is_error() {
                    writeln!(self.out, "{}", render_rows(&self.session.rows()))?;
                }
                return Ok((Flow::Continue, reply.status.is_error()));
            }
            Command::View(index) => self.session.view(index),
            Command::Delete(index) => {
                let reply = self.session.delete(index);
                self.print_reply(&reply)?;
                if !reply.status.is_error() {
                    writeln!(self.out, "{}", render_rows(&self.session.rows()))?;
                }
                return Ok((Flow::Continue, reply.status.is_error()));
            }
            Command::Export {
                format: ExportFormat::Jsonl,
                keep_system,
            } => self.session.export_jsonl(keep_system),
            Command::Export {
                format: ExportFormat::Object,
                ..
            } => self.session.export_object(),
        };

        self.print_reply(&reply)?;
        Ok((Flow::Continue, reply.status.is_error()))
    }

    fn print_reply(&mut self, reply: &Reply) -> io::Result<()> {
        if let Some(body) = &reply.body {
            writeln!(self.out, "{body}")?;
        }
        self.print_status(&reply.status)
    }

    fn print_status(&mut self, status: &Status) -> io::Result<()> {
        let marker = match status.level {
            StatusLevel::Info => "--",
            StatusLevel::Success => "ok",
            StatusLevel::Error => "!!",
        };
        writeln!(self.out, "{marker} {}", status.text)
    }
}

/// Collect lines until a lone `.`; `None` when the input is interrupted or closes first.
fn read_block(source: &mut dyn LineSource) -> Result<Option<String>> {
    let mut lines = Vec::new();
    loop {
        match source.read_line(EDIT_PROMPT)? {
            LineEvent::Line(line) if line.trim_end() == "." => break,
            LineEvent::Line(line) => lines.push(line),
            LineEvent::Interrupted | LineEvent::Closed => return Ok(None),
        }
    }
    Ok(Some(lines.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::clipboard::MemoryClipboard;
    use crate::infra::config::Config;

    fn run_script(script: &str) -> (String, RunStats, Session) {
        let mut shell = Shell::new(
            Session::new(Config::default()),
            Box::new(MemoryClipboard::default()),
            Vec::new(),
        );
        let stats = shell.run(&mut ScriptSource::new(script)).unwrap();
        let session = shell.session().clone();
        let output = String::from_utf8(shell.into_output()).unwrap();
        (output, stats, session)
    }

    #[test]
    fn edit_reads_until_dot() {
        let (_, stats, session) = run_script("edit thought\nfirst step\n\nsecond step\n.\n");
        assert_eq!(stats.errors, 0);
        assert_eq!(session.fields().thought, "first step\n\nsecond step");
    }

    #[test]
    fn unterminated_edit_is_cancelled() {
        let (output, _, session) = run_script("edit code\nx = 1\n");
        assert!(output.contains("Edit of code cancelled."));
        assert!(session.fields().code.contains("answer_code"));
    }

    #[test]
    fn add_prints_status_and_table() {
        let (output, stats, session) = run_script("include question answer\nadd\n");
        assert_eq!(stats.commands, 2);
        assert_eq!(session.dataset().len(), 1);
        assert!(output.contains("ok Added example. 1 in dataset."));
        assert!(output.contains("# | answer | thought | question"));
    }

    #[test]
    fn errors_are_reported_and_counted() {
        let (output, stats, _) = run_script("bogus\nview 1\nset system \nadd\n");
        assert_eq!(stats.errors, 2);
        assert!(output.contains("!! unknown command 'bogus'"));
        assert!(output.contains("-- Dataset is empty."));
        assert!(output.contains("!! Please fill: System."));
    }

    #[test]
    fn quit_stops_processing() {
        let (_, stats, session) = run_script("quit\nadd\n");
        assert_eq!(stats.commands, 1);
        assert!(session.dataset().is_empty());
    }

    #[test]
    fn stop_on_error_halts_script() {
        let mut shell = Shell::new(
            Session::new(Config::default()),
            Box::new(MemoryClipboard::default()),
            Vec::new(),
        )
        .stop_on_error(true);
        let stats = shell
            .run(&mut ScriptSource::new("view x\nadd\n"))
            .unwrap();
        assert_eq!(stats.errors, 1);
        assert!(shell.session().dataset().is_empty());
    }
}
