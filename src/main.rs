//! procrun: run an executable with a timeout and captured output.
//!
//! This is the main entry point for the `procrun` CLI. It parses arguments,
//! sets up logging, dispatches to the command handler, and maps errors to
//! exit codes.

mod cli;
mod commands;

use cli::Cli;
use procrun::logging::init_logging;
use procrun::{Config, exit_codes};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut cli = Cli::parse_args();

    let Some(command) = cli.command.take() else {
        println!("{}", procrun::banner());
        return exit_status(exit_codes::SUCCESS);
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            return exit_status(err.cli_exit_code());
        }
    };

    if let Err(err) = init_logging(&cli.log_settings(config.log_level)) {
        eprintln!("procrun: logging setup failed, continuing without it: {}", err);
    }

    match commands::dispatch(command, config) {
        Ok(code) => exit_status(code),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);
            exit_status(err.cli_exit_code())
        }
    }
}

/// Clamp a status into the 0-255 range a process can report.
fn exit_status(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(exit_codes::FAILURE as u8))
}
