//! exforge: configuration-driven programming exercise assembly.
//!
//! This is the main entry point for the `exforge` CLI. It parses arguments,
//! loads the config, installs logging, dispatches to the appropriate command
//! handler, and handles errors with proper exit codes.

use exforge::cli::Cli;
use exforge::commands::{self, Runtime};
use exforge::config::Config;
use exforge::{exit_codes, logging};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let cwd = std::env::current_dir().unwrap_or_else(|_| ".".into());
    let config = match Config::discover(cli.config.as_deref(), &cwd) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::from(err.exit_code() as u8);
        }
    };

    logging::init(logging::effective_level(config.log_level, cli.verbose));

    let runtime = Runtime::new(config);
    match commands::dispatch(&runtime, cli.command) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            ExitCode::from(err.exit_code() as u8)
        }
    }
}
