//! Process runner.
//!
//! Runs one executable to completion on the calling thread: options are
//! validated, the executable is resolved, the child is started with its
//! output redirected to anonymous temporary files, and the wait is bounded
//! by the timeout. Every outcome other than success (or a tolerated non-zero
//! exit) comes back as an [`ExecError`].

mod capture;
mod wait;


use crate::config::{Config, positive_seconds};
use crate::error::{ExecError, Failure, Result};
use crate::exit_codes;
use crate::logging::{PerfTimer, RUNNER_TARGET};
use crate::resolve::resolve_with;
use crate::result::ExecutionResult;
use crate::util::{format_bytes, format_duration};
use capture::Capture;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use wait::{Outcome, wait_with_timeout};

/// Per-run options.
///
/// Anything left unset falls back to the runner's [`Config`] (timeout) or to
/// the parent process (working directory, environment).
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Arguments passed to the executable.
    pub args: Vec<String>,
    /// Working directory; must already exist.
    pub cwd: Option<PathBuf>,
    /// Variables laid over the inherited environment.
    pub env_vars: Option<BTreeMap<String, String>>,
    /// Timeout in seconds.
    pub timeout: Option<f64>,
    /// Capture stdout/stderr instead of inheriting the caller's streams.
    pub capture_output: bool,
    /// Turn a non-zero exit into an error.
    pub check_exit_code: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            cwd: None,
            env_vars: None,
            timeout: None,
            capture_output: true,
            check_exit_code: true,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let env = self.env_vars.get_or_insert_with(BTreeMap::new);
        for (key, value) in vars {
            env.insert(key.into(), value.into());
        }
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout.as_secs_f64());
        self
    }

    pub fn timeout_secs(mut self, seconds: f64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn capture_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }

    pub fn check_exit_code(mut self, check: bool) -> Self {
        self.check_exit_code = check;
        self
    }
}

/// Runs executables with a fixed [`Config`].
///
/// A runner holds no per-run state and can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    config: Config,
}

impl Runner {
    pub fn new(config: Config) -> Self {
        for path in &config.search_paths {
            if !path.exists() {
                tracing::warn!(
                    target: RUNNER_TARGET,
                    path = %path.display(),
                    "search path does not exist"
                );
            }
        }
        Self { config }
    }

    /// Runner configured from `PROCRUN_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Config::from_env()?))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve `name` against the configured search paths, then PATH.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let path_var = std::env::var_os("PATH");
        resolve_with(name, path_var.as_deref(), &self.config.search_paths)
    }

    /// Run `executable` and wait for it to finish.
    ///
    /// # Errors
    ///
    /// * `InvalidConfiguration` - an option is invalid; nothing was started
    /// * `NotFound` / `PermissionDenied` - the executable could not be resolved
    /// * `TimedOut` - the child was killed at the deadline
    /// * `Failed` - non-zero exit (when checked) or the OS could not start it
    pub fn run(&self, executable: &str, options: &RunOptions) -> Result<ExecutionResult> {
        let timeout = validate(executable, options)?.or(self.config.default_timeout);
        let path = self.resolve(executable)?;

        let launch = Launch {
            executable,
            options,
            start: Instant::now(),
        };

        tracing::debug!(
            target: RUNNER_TARGET,
            command = %launch.command_line(),
            path = %path.display(),
            cwd = ?options.cwd,
            timeout = ?timeout,
            capture = options.capture_output,
            "running command"
        );

        let capture = if options.capture_output {
            Some(Capture::new().map_err(|e| launch.os_error(e))?)
        } else {
            None
        };

        let mut command = Command::new(&path);
        command.args(&options.args);
        if let Some(cwd) = &options.cwd {
            command.current_dir(cwd);
        }
        if let Some(env) = &options.env_vars {
            tracing::trace!(
                target: RUNNER_TARGET,
                keys = ?env.keys().collect::<Vec<_>>(),
                "overlaying environment"
            );
            command.envs(env);
        }
        match &capture {
            Some(capture) => {
                let (stdout, stderr) = capture.stdio().map_err(|e| launch.os_error(e))?;
                command.stdout(stdout).stderr(stderr);
            }
            None => {
                command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
        }

        let timer = PerfTimer::start(format!("run {}", executable));
        let mut child = command.spawn().map_err(|e| launch.os_error(e))?;
        let outcome = wait_with_timeout(&mut child, timeout);
        let elapsed = launch.start.elapsed();
        timer.finish();

        let exit_code = match outcome {
            Ok(Outcome::Exited(code)) => code,
            Ok(Outcome::TimedOut) => {
                let timeout = timeout.unwrap_or(elapsed);
                return Err(launch.timed_out(capture, elapsed, timeout));
            }
            Err(e) => return Err(launch.os_error(e)),
        };

        let (stdout, stderr) = match capture {
            Some(capture) => capture.read().map_err(|e| launch.os_error(e))?,
            None => (String::new(), String::new()),
        };

        let output_size = (stdout.len() + stderr.len()) as u64;
        if output_size > self.config.max_output_size {
            tracing::warn!(
                target: RUNNER_TARGET,
                command = %launch.command_line(),
                "output size {} exceeds max_output_size {}",
                format_bytes(output_size),
                format_bytes(self.config.max_output_size)
            );
        }

        tracing::debug!(
            target: RUNNER_TARGET,
            exit_code,
            elapsed = %format_duration(elapsed.as_secs_f64()),
            "command finished"
        );

        if exit_code != exit_codes::SUCCESS && options.check_exit_code {
            let captured = options.capture_output;
            return Err(ExecError::failed(
                launch
                    .failure(exit_code, elapsed)
                    .with_stdout(captured.then_some(stdout))
                    .with_stderr(captured.then_some(stderr)),
            ));
        }

        Ok(ExecutionResult::new(
            executable,
            options.args.clone(),
            exit_code,
            stdout,
            stderr,
            elapsed,
            options.cwd.clone(),
            options.env_vars.clone(),
        ))
    }
}

/// Run `executable` with a default-configured [`Runner`].
pub fn run(executable: &str, options: &RunOptions) -> Result<ExecutionResult> {
    Runner::default().run(executable, options)
}

/// Check options before anything touches the filesystem or process table.
///
/// Returns the explicit timeout, if one was given.
fn validate(executable: &str, options: &RunOptions) -> Result<Option<Duration>> {
    if executable.is_empty() {
        return Err(ExecError::invalid_config(
            "executable must be a non-empty string",
            "executable",
            executable,
        ));
    }

    if let Some(arg) = options.args.iter().find(|arg| arg.contains('\0')) {
        return Err(ExecError::invalid_config(
            "arguments must not contain NUL bytes",
            "args",
            arg.replace('\0', "\\0"),
        ));
    }

    if let Some(env) = &options.env_vars {
        for (key, value) in env {
            if key.is_empty() || key.contains(['=', '\0']) {
                return Err(ExecError::invalid_config(
                    format!("invalid environment variable name: {:?}", key),
                    "env_vars",
                    key.replace('\0', "\\0"),
                ));
            }
            if value.contains('\0') {
                return Err(ExecError::invalid_config(
                    format!("environment variable {} must not contain NUL bytes", key),
                    "env_vars",
                    key.as_str(),
                ));
            }
        }
    }

    let timeout = options
        .timeout
        .map(|seconds| positive_seconds(seconds, "timeout"))
        .transpose()?;

    if let Some(cwd) = &options.cwd {
        if !cwd.is_dir() {
            return Err(ExecError::invalid_config(
                format!("Working directory does not exist: {}", cwd.display()),
                "cwd",
                cwd.display().to_string(),
            ));
        }
    }

    Ok(timeout)
}

/// The parts of a run that every error built after launch needs.
struct Launch<'a> {
    executable: &'a str,
    options: &'a RunOptions,
    start: Instant,
}

impl Launch<'_> {
    fn command_line(&self) -> String {
        Failure::new(self.executable, 0)
            .with_args(self.options.args.clone())
            .command_line()
    }

    fn failure(&self, exit_code: i32, elapsed: Duration) -> Failure {
        Failure::new(self.executable, exit_code)
            .with_args(self.options.args.clone())
            .with_execution_time(elapsed)
    }

    /// The OS refused to start or supervise the child.
    fn os_error(&self, error: std::io::Error) -> ExecError {
        let failure = self
            .failure(exit_codes::OS_ERROR_SENTINEL, self.start.elapsed())
            .with_stderr(Some(error.to_string()));
        ExecError::failed(failure).with_source(error)
    }

    fn timed_out(&self, capture: Option<Capture>, elapsed: Duration, timeout: Duration) -> ExecError {
        let (stdout, stderr) = match capture {
            Some(capture) => {
                let (stdout, stderr) = capture.read().unwrap_or_else(|e| {
                    tracing::debug!(target: RUNNER_TARGET, error = %e, "could not read partial output");
                    (String::new(), String::new())
                });
                (Some(stdout), Some(stderr))
            }
            None => (None, None),
        };

        ExecError::timed_out(
            self.failure(exit_codes::TIMEOUT_SENTINEL, elapsed)
                .with_stdout(stdout)
                .with_stderr(stderr),
            timeout,
        )
    }
}
