//! CLI argument parsing for procrun.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use procrun::logging::{LogFormat, LogLevel, LogSettings};
use std::path::PathBuf;

/// procrun: run an executable with a timeout and captured output.
///
/// Without a subcommand, prints a one-line usage banner.
#[derive(Parser, Debug)]
#[command(name = "procrun")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log level (overrides PROCRUN_LOG_LEVEL).
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Log line layout (overrides PROCRUN_LOG_FORMAT).
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Also append logs to this file (overrides PROCRUN_LOG_FILE).
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Do not log to stderr.
    #[arg(long, global = true)]
    pub no_console: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands for procrun.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run an executable and wait for it.
    ///
    /// Prints the captured stdout/stderr and exits with the child's exit code.
    Run(RunArgs),

    /// Print the absolute path an executable name resolves to.
    Which(WhichArgs),
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Kill the command after this many seconds.
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    pub timeout: Option<f64>,

    /// Working directory for the command.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Extra environment variable (repeatable).
    #[arg(short = 'e', long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Let the command write to this terminal instead of capturing output.
    #[arg(long)]
    pub no_capture: bool,

    /// Do not treat a non-zero exit code as an error.
    #[arg(long)]
    pub no_check: bool,

    /// Print the result (or error) as JSON.
    #[arg(long)]
    pub json: bool,

    /// Executable followed by its arguments.
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "EXECUTABLE [ARGS]"
    )]
    pub command: Vec<String>,
}

/// Arguments for the `which` command.
#[derive(Args, Debug)]
pub struct WhichArgs {
    /// Executable name or path.
    pub name: String,
}

fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Logging settings: environment first, then flags on top.
    ///
    /// Errors are printed by `main`, so the console layer leaves them out.
    pub fn log_settings(&self, level: LogLevel) -> LogSettings {
        let mut settings = LogSettings::from_env()
            .with_level(self.log_level.unwrap_or(level))
            .with_console_errors(false);
        if let Some(format) = self.log_format {
            settings.format = format;
        }
        if let Some(file) = &self.log_file {
            settings.file = Some(file.clone());
        }
        if self.no_console {
            settings.console = false;
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        // Verifies the CLI arguments configuration is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_no_command() {
        let cli = Cli::try_parse_from(["procrun"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parse_run_minimal() {
        let cli = Cli::try_parse_from(["procrun", "run", "echo"]).unwrap();
        if let Some(Command::Run(args)) = cli.command {
            assert_eq!(args.command, vec!["echo"]);
            assert_eq!(args.timeout, None);
            assert!(args.env.is_empty());
            assert!(!args.no_capture);
            assert!(!args.no_check);
            assert!(!args.json);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_run_full() {
        let cli = Cli::try_parse_from([
            "procrun",
            "run",
            "--timeout",
            "2.5",
            "--cwd",
            "/tmp",
            "-e",
            "A=1",
            "--env",
            "B=x=y",
            "--no-check",
            "--json",
            "ls",
            "-la",
            "--color",
        ])
        .unwrap();
        if let Some(Command::Run(args)) = cli.command {
            assert_eq!(args.timeout, Some(2.5));
            assert_eq!(args.cwd, Some(PathBuf::from("/tmp")));
            assert_eq!(
                args.env,
                vec![
                    ("A".to_string(), "1".to_string()),
                    ("B".to_string(), "x=y".to_string())
                ]
            );
            assert!(args.no_check);
            assert!(args.json);
            assert_eq!(args.command, vec!["ls", "-la", "--color"]);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_run_requires_executable() {
        assert!(Cli::try_parse_from(["procrun", "run"]).is_err());
    }

    #[test]
    fn parse_run_rejects_bad_env_pair() {
        assert!(Cli::try_parse_from(["procrun", "run", "-e", "NOVALUE", "true"]).is_err());
        assert!(Cli::try_parse_from(["procrun", "run", "-e", "=x", "true"]).is_err());
    }

    #[test]
    fn parse_which() {
        let cli = Cli::try_parse_from(["procrun", "which", "sh"]).unwrap();
        if let Some(Command::Which(args)) = cli.command {
            assert_eq!(args.name, "sh");
        } else {
            panic!("Expected Which command");
        }
    }

    #[test]
    fn parse_global_log_flags() {
        let cli = Cli::try_parse_from([
            "procrun",
            "which",
            "sh",
            "--log-level",
            "debug",
            "--log-format",
            "detailed",
            "--no-console",
        ])
        .unwrap();

        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert_eq!(cli.log_format, Some(LogFormat::Detailed));
        assert!(cli.no_console);
    }

    #[test]
    fn log_settings_flags_override_level() {
        let cli = Cli::try_parse_from(["procrun", "--log-level", "trace", "--no-console"]).unwrap();
        let settings = cli.log_settings(LogLevel::Warn);
        assert_eq!(settings.level, LogLevel::Trace);
        assert!(!settings.console);
        assert!(!settings.console_errors);

        let cli = Cli::try_parse_from(["procrun"]).unwrap();
        assert_eq!(cli.log_settings(LogLevel::Info).level, LogLevel::Info);
    }
}
