mod commands;
mod config;
mod script;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{init, run, validate_definitions, InitArgs, RunArgs, ValidateArgs};
use config::Config;
use tracing_subscriber::EnvFilter;

/// genui - replay and check declarative generic UIs
#[derive(Parser, Debug)]
#[command(name = "genui")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a config plus an example definition and script
    Init(InitArgs),

    /// Load a definition and replay an event script against it
    Run(RunArgs),

    /// Check definitions without running them
    Validate(ValidateArgs),
}

fn init_tracing(cwd: &str) {
    let level = Config::load(cwd)
        .map(|config| config.log_level)
        .unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };
    init_tracing(&cwd);

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Run(args) => run(args, &cwd),
        Command::Validate(args) => validate_definitions(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
