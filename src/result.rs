//! The record of a completed run.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Result of running an executable to completion.
///
/// Built once by the runner and handed to the caller; fields are read
/// through accessors only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    executable: String,
    args: Vec<String>,
    exit_code: i32,
    stdout: String,
    stderr: String,
    #[serde(serialize_with = "as_seconds")]
    execution_time: Duration,
    cwd: Option<PathBuf>,
    env_vars: Option<BTreeMap<String, String>>,
}

fn as_seconds<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

impl ExecutionResult {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        executable: impl Into<String>,
        args: Vec<String>,
        exit_code: i32,
        stdout: String,
        stderr: String,
        execution_time: Duration,
        cwd: Option<PathBuf>,
        env_vars: Option<BTreeMap<String, String>>,
    ) -> Self {
        Self {
            executable: executable.into(),
            args,
            exit_code,
            stdout,
            stderr,
            execution_time,
            cwd,
            env_vars,
        }
    }

    /// Executable name as given by the caller (not the resolved path).
    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Captured stdout; empty when capture was disabled.
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Captured stderr; empty when capture was disabled.
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn execution_time(&self) -> Duration {
        self.execution_time
    }

    pub fn execution_time_secs(&self) -> f64 {
        self.execution_time.as_secs_f64()
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Extra environment variables applied on top of the inherited environment.
    pub fn env_vars(&self) -> Option<&BTreeMap<String, String>> {
        self.env_vars.as_ref()
    }

    /// True when the exit code is 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// The executable followed by its arguments, space separated.
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.executable.clone()
        } else {
            format!("{} {}", self.executable, self.args.join(" "))
        }
    }
}
