//! Parsing of shell commands.

use std::path::PathBuf;

use thiserror::Error;

use crate::app::dataset::parse_index;
use crate::app::export::{ExportFormat, ExportFormatParseError};
use crate::domain::errors::DomainError;
use crate::domain::model::{ApisScope, FieldName, ParseError, Section};

/// One line of user input, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// Print the template and the current field values.
    Show,
    /// Print the summary table.
    List,
    Include(Vec<Section>),
    Scope(ApisScope),
    ShowSystem(bool),
    ShowGlobalApis(bool),
    Set(FieldName, String),
    /// Read a multi-line value until a lone `.`.
    Edit(FieldName),
    Load(FieldName, PathBuf),
    Clear(FieldName),
    Reset,
    Preview,
    Copy,
    Add,
    View(i64),
    Delete(i64),
    Export {
        format: ExportFormat,
        keep_system: Option<bool>,
    },
    Quit,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}' (type 'help' for a list)")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("expected on or off, got '{0}'")]
    InvalidToggle(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Index(#[from] DomainError),
    #[error(transparent)]
    Format(#[from] ExportFormatParseError),
}

pub const HELP: &str = "\
Template:  include <sections...> | scope per|global | show-system on|off | show-global-apis on|off
Fields:    set <field> <text> | edit <field> | load <field> <path> | clear <field> | reset
           show | template
           fields: system, global-apis, apis, question, thought, code, answer
Examples:  preview | copy | add | list | view <n> | delete <n>
Export:    export jsonl [--drop-system] | export object
Other:     help | quit";

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "help" | "?" => Command::Help,
        "show" | "template" => Command::Show,
        "list" | "ls" => Command::List,
        "include" => Command::Include(parse_sections(rest)?),
        "scope" => {
            if rest.is_empty() {
                return Err(CommandError::Usage("scope per|global"));
            }
            Command::Scope(rest.parse()?)
        }
        "show-system" => Command::ShowSystem(parse_toggle(rest)?),
        "show-global-apis" => Command::ShowGlobalApis(parse_toggle(rest)?),
        "set" => {
            let (field, value) = match rest.split_once(char::is_whitespace) {
                Some((field, value)) => (field, value.trim_start()),
                None => (rest, ""),
            };
            if field.is_empty() {
                return Err(CommandError::Usage("set <field> <text>"));
            }
            Command::Set(field.parse()?, unescape(value))
        }
        "edit" => Command::Edit(required_field(rest, "edit <field>")?),
        "load" => {
            let (field, path) = rest
                .split_once(char::is_whitespace)
                .ok_or(CommandError::Usage("load <field> <path>"))?;
            Command::Load(field.parse()?, PathBuf::from(path.trim()))
        }
        "clear" => Command::Clear(required_field(rest, "clear <field>")?),
        "reset" => Command::Reset,
        "preview" | "p" => Command::Preview,
        "copy" => Command::Copy,
        "add" => Command::Add,
        "view" => Command::View(required_index(rest, "view <n>")?),
        "delete" | "rm" => Command::Delete(required_index(rest, "delete <n>")?),
        "export" => parse_export(rest)?,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn parse_sections(input: &str) -> Result<Vec<Section>, CommandError> {
    let mut sections = Vec::new();
    for token in input
        .split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter(|token| !token.is_empty())
    {
        if token.eq_ignore_ascii_case("none") {
            continue;
        }
        if token.eq_ignore_ascii_case("all") {
            sections.extend_from_slice(Section::all());
            continue;
        }
        sections.push(token.parse()?);
    }
    Ok(sections)
}

fn parse_toggle(input: &str) -> Result<bool, CommandError> {
    match input.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(CommandError::InvalidToggle(other.to_string())),
    }
}

fn required_field(input: &str, usage: &'static str) -> Result<FieldName, CommandError> {
    if input.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    Ok(input.parse()?)
}

fn required_index(input: &str, usage: &'static str) -> Result<i64, CommandError> {
    if input.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    Ok(parse_index(input)?)
}

fn parse_export(input: &str) -> Result<Command, CommandError> {
    let mut parts = input.split_whitespace();
    let format: ExportFormat = parts
        .next()
        .ok_or(CommandError::Usage("export jsonl [--drop-system] | export object"))?
        .parse()?;

    let mut keep_system = None;
    for flag in parts {
        match flag {
            "--drop-system" if format == ExportFormat::Jsonl => keep_system = Some(false),
            "--keep-system" if format == ExportFormat::Jsonl => keep_system = Some(true),
            _ => {
                return Err(CommandError::Usage(
                    "export jsonl [--drop-system] | export object",
                ));
            }
        }
    }
    Ok(Command::Export {
        format,
        keep_system,
    })
}

/// Expand `\n`, `\t`, and `\\` so single-line input can carry multi-line values.
fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> Command {
        parse(line).unwrap().unwrap()
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(parse("   "), Ok(None));
        assert_eq!(parse("# a comment"), Ok(None));
    }

    #[test]
    fn set_keeps_text_and_expands_escapes() {
        assert_eq!(
            parsed("set question What modality is this?"),
            Command::Set(FieldName::Question, "What modality is this?".into())
        );
        assert_eq!(
            parsed(r"set code x = 1\nreturn x"),
            Command::Set(FieldName::Code, "x = 1\nreturn x".into())
        );
        assert_eq!(
            parsed("set answer"),
            Command::Set(FieldName::Answer, String::new())
        );
        assert_eq!(unescape(r"a\\n\q"), r"a\n\q");
    }

    #[test]
    fn include_accepts_commas_and_keywords() {
        assert_eq!(
            parsed("include question, answer"),
            Command::Include(vec![Section::Question, Section::Answer])
        );
        assert_eq!(parsed("include none"), Command::Include(Vec::new()));
        assert_eq!(
            parsed("include all"),
            Command::Include(Section::all().to_vec())
        );
        assert!(parse("include summary").is_err());
    }

    #[test]
    fn template_toggles_parse() {
        assert_eq!(parsed("template"), Command::Show);
        assert_eq!(parsed("scope global"), Command::Scope(ApisScope::Global));
        assert_eq!(parsed("show-system off"), Command::ShowSystem(false));
        assert_eq!(parsed("show-global-apis on"), Command::ShowGlobalApis(true));
        assert_eq!(
            parse("show-system maybe"),
            Err(CommandError::InvalidToggle("maybe".into()))
        );
    }

    #[test]
    fn indices_are_parsed_leniently() {
        assert_eq!(parsed("view 2"), Command::View(2));
        assert_eq!(parsed("delete 3.0"), Command::Delete(3));
        assert!(matches!(
            parse("view two"),
            Err(CommandError::Index(DomainError::InvalidIndex(_)))
        ));
        assert_eq!(parse("view"), Err(CommandError::Usage("view <n>")));
    }

    #[test]
    fn export_formats_and_flags() {
        assert_eq!(
            parsed("export jsonl --drop-system"),
            Command::Export {
                format: ExportFormat::Jsonl,
                keep_system: Some(false)
            }
        );
        assert_eq!(
            parsed("export object"),
            Command::Export {
                format: ExportFormat::Object,
                keep_system: None
            }
        );
        assert!(parse("export object --drop-system").is_err());
        assert!(parse("export csv").is_err());
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert_eq!(
            parse("frobnicate now"),
            Err(CommandError::Unknown("frobnicate".into()))
        );
    }
}
