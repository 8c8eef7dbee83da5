mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{init, lint, InitArgs, LintArgs};
use tracing_subscriber::EnvFilter;

/// windlint - conflict and canonical-form checks for utility classes
#[derive(Parser, Debug)]
#[command(name = "windlint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a windlint.config.json
    Init(InitArgs),

    /// Lint class lists in markup files
    Lint(LintArgs),
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(matches!(&cli.command, Command::Lint(args) if args.verbose));

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd).map(|()| true),
        Command::Lint(args) => lint(args, &cwd).await.map(|summary| summary.errors == 0),
    };

    match result {
        Ok(true) => {}
        // Exit with error code if there are errors
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!();
            eprintln!("{} {}", "Error:".red().bold(), err);
            eprintln!();
            std::process::exit(1);
        }
    }
}
