//! # ifcjson-validate entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ifcjson_cli::check::{run_check, CheckArgs};
use ifcjson_cli::lint::{run_lint, LintArgs};
use ifcjson_cli::report::OutputFormat;
use ifcjson_cli::validate::{run_validate, ValidateArgs};

/// ifcJSON validation runner.
///
/// Lints the IFC4x2 schema set, registers it, and validates ifcJSON data
/// files against it.
#[derive(Parser, Debug)]
#[command(name = "ifcjson-validate", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lint the schema set and validate data documents against it.
    Check(CheckArgs),

    /// Validate data documents against the schema set.
    Validate(ValidateArgs),

    /// Lint JSON files for well-formedness.
    Lint(LintArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    tracing::debug!(cwd = %cwd.display(), "ifcjson-validate starting");

    let result = match cli.command {
        Commands::Check(args) => run_check(&args, cli.format, &cwd),
        Commands::Validate(args) => run_validate(&args, cli.format, &cwd),
        Commands::Lint(args) => run_lint(&args, cli.format, &cwd),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
