use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

use fewshot::app::session::Session;
use fewshot::infra::clipboard::SystemClipboard;
use fewshot::infra::config::Config;
use fewshot::ui::commands::HELP;
use fewshot::ui::shell::{ScriptSource, Shell, TerminalSource};

#[derive(Parser)]
#[command(author, version, about = "Build few-shot prompt datasets", long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive authoring shell (default)
    Shell,
    /// Execute shell commands from a file
    Run {
        script: PathBuf,
        /// Stop at the first failing command and exit non-zero
        #[arg(long)]
        strict: bool,
    },
    /// Print shell completions
    Completions { shell: CompletionShell },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    fewshot::init(cli.verbose);

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => run_interactive()?,
        Commands::Run { script, strict } => run_script(script, strict)?,
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "fewshot", &mut io::stdout());
        }
    }
    Ok(())
}

fn run_interactive() -> Result<()> {
    let session = Session::new(Config::load()?);
    println!("{HELP}");
    let mut shell = Shell::new(session, Box::new(SystemClipboard::new()), io::stdout());
    shell.run(&mut TerminalSource::new())?;
    Ok(())
}

fn run_script(script: PathBuf, strict: bool) -> Result<()> {
    let contents = fs::read_to_string(&script)
        .with_context(|| format!("failed to read script {}", script.display()))?;
    let session = Session::new(Config::load()?);
    let mut shell = Shell::new(session, Box::new(SystemClipboard::new()), io::stdout())
        .stop_on_error(strict);
    let stats = shell.run(&mut ScriptSource::new(&contents))?;
    if strict && stats.errors > 0 {
        bail!("script stopped after {} failing command(s)", stats.errors);
    }
    Ok(())
}
