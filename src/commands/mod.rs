//! Command implementations for procrun.
//!
//! Each handler returns the process exit status to report on success;
//! errors are reported by `main`.

use crate::cli::{Command, RunArgs, WhichArgs};
use procrun::error::{ExecError, Result};
use procrun::{Config, RunOptions, Runner, exit_codes};

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command, config: Config) -> Result<i32> {
    let runner = Runner::new(config);
    match command {
        Command::Run(args) => cmd_run(&runner, args),
        Command::Which(args) => cmd_which(&runner, args),
    }
}

fn cmd_run(runner: &Runner, args: RunArgs) -> Result<i32> {
    let mut command = args.command.into_iter();
    let executable = command.next().unwrap_or_default();

    let mut options = RunOptions::new()
        .args(command)
        .capture_output(!args.no_capture)
        .check_exit_code(!args.no_check);
    if let Some(seconds) = args.timeout {
        options = options.timeout_secs(seconds);
    }
    if let Some(cwd) = args.cwd {
        options = options.cwd(cwd);
    }
    if !args.env.is_empty() {
        options = options.envs(args.env);
    }

    let result = match runner.run(&executable, &options) {
        Ok(result) => result,
        Err(err) if args.json => {
            let record = err.to_record();
            eprintln!("{}", to_json(&record)?);
            return Ok(err.cli_exit_code());
        }
        Err(err) => {
            let (stdout, stderr) = failure_output(&err);
            print!("{}", stdout);
            eprint!("{}", stderr);
            return Err(err);
        }
    };

    if args.json {
        println!("{}", to_json(&result)?);
    } else {
        print!("{}", result.stdout());
        eprint!("{}", result.stderr());
    }

    Ok(result.exit_code())
}

fn cmd_which(runner: &Runner, args: WhichArgs) -> Result<i32> {
    let path = runner.resolve(&args.name)?;
    println!("{}", path.display());
    Ok(exit_codes::SUCCESS)
}

/// Output the failed command itself produced. An OS launch error carries
/// the error text in stderr, which the error message already shows.
fn failure_output(err: &ExecError) -> (&str, &str) {
    if err.exit_code() == Some(exit_codes::OS_ERROR_SENTINEL) {
        return ("", "");
    }
    (err.stdout().unwrap_or(""), err.stderr().unwrap_or(""))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        ExecError::general(
            format!("failed to serialize output: {}", e),
            Default::default(),
        )
        .with_source(e)
    })
}
