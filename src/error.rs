//! Error types for procrun.
//!
//! Uses thiserror for the `Error` impl. Every failure is one [`ExecError`]
//! whose [`ErrorKind`] says what went wrong; the kind-specific payload is
//! mirrored into an ordered details map so errors can be logged and
//! serialized without knowing the kind.

mod render;
mod suggestions;

#[cfg(test)]
mod tests;

pub use render::{render_message, render_value};

use crate::exit_codes;
use crate::logging::ERRORS_TARGET;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Structured debugging context attached to an error, in insertion order.
pub type Details = serde_json::Map<String, Value>;

/// Result type alias for procrun operations.
pub type Result<T> = std::result::Result<T, ExecError>;

/// What we know about a command that ran (or tried to run) and failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    /// Executable name as given by the caller.
    pub executable: String,
    /// Real exit code, or one of the sentinels in [`exit_codes`].
    pub exit_code: i32,
    /// Arguments passed to the executable.
    pub args: Vec<String>,
    /// Captured stdout; `None` when output was not captured.
    pub stdout: Option<String>,
    /// Captured stderr; `None` when output was not captured.
    pub stderr: Option<String>,
    /// Wall-clock time until the failure was observed.
    pub execution_time: Option<Duration>,
}

impl Failure {
    pub fn new(executable: impl Into<String>, exit_code: i32) -> Self {
        Self {
            executable: executable.into(),
            exit_code,
            args: Vec::new(),
            stdout: None,
            stderr: None,
            execution_time: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_stdout(mut self, stdout: Option<String>) -> Self {
        self.stdout = stdout;
        self
    }

    pub fn with_stderr(mut self, stderr: Option<String>) -> Self {
        self.stderr = stderr;
        self
    }

    pub fn with_execution_time(mut self, elapsed: Duration) -> Self {
        self.execution_time = Some(elapsed);
        self
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

/// The category of an [`ExecError`] together with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// Free-form error with caller supplied context.
    General { message: String, details: Details },

    /// The executable could not be resolved.
    NotFound {
        executable: String,
        search_paths: Vec<PathBuf>,
    },

    /// The executable exists but carries no execute permission.
    PermissionDenied {
        executable: String,
        search_paths: Vec<PathBuf>,
        file_mode: Option<String>,
    },

    /// The command exited non-zero, or the OS refused to start it.
    Failed(Failure),

    /// The command was killed after exceeding `timeout`.
    TimedOut { failure: Failure, timeout: Duration },

    /// A caller supplied parameter or configuration value was invalid.
    InvalidConfiguration {
        message: String,
        key: Option<String>,
        value: Option<Value>,
        valid_values: Vec<Value>,
    },
}

impl ErrorKind {
    /// Stable kind name used in serialized records.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::General { .. } => "Error",
            ErrorKind::NotFound { .. } => "NotFound",
            ErrorKind::PermissionDenied { .. } => "PermissionDenied",
            ErrorKind::Failed(_) => "Failed",
            ErrorKind::TimedOut { .. } => "TimedOut",
            ErrorKind::InvalidConfiguration { .. } => "InvalidConfiguration",
        }
    }

    fn normalized(self) -> Self {
        match self {
            ErrorKind::TimedOut {
                mut failure,
                timeout,
            } => {
                failure.exit_code = exit_codes::TIMEOUT_SENTINEL;
                failure.execution_time.get_or_insert(timeout);
                ErrorKind::TimedOut { failure, timeout }
            }
            other => other,
        }
    }

    fn message(&self) -> String {
        match self {
            ErrorKind::General { message, .. } | ErrorKind::InvalidConfiguration { message, .. } => {
                message.clone()
            }
            ErrorKind::NotFound {
                executable,
                search_paths,
            } => {
                let mut message =
                    format!("Executable '{}' not found in PATH or specified location", executable);
                if !search_paths.is_empty() {
                    message.push_str(&format!(" (searched: {})", join_paths(search_paths)));
                }
                message
            }
            ErrorKind::PermissionDenied { executable, .. } => {
                format!("Permission denied: '{}' is not executable", executable)
            }
            ErrorKind::Failed(failure) => format!(
                "Command '{}' failed with exit code {}",
                failure.command_line(),
                failure.exit_code
            ),
            ErrorKind::TimedOut { failure, timeout } => format!(
                "Command '{}' timed out after {:?} seconds",
                failure.command_line(),
                timeout.as_secs_f64()
            ),
        }
    }

    fn details(&self) -> Details {
        let mut details = Details::new();
        match self {
            ErrorKind::General { details: extra, .. } => {
                details.extend(extra.clone());
            }
            ErrorKind::NotFound {
                executable,
                search_paths,
            } => {
                details.insert("executable".into(), executable.as_str().into());
                if !search_paths.is_empty() {
                    details.insert("search_paths".into(), paths_value(search_paths));
                }
                details.insert("suggestions".into(), suggestions::not_found(executable));
            }
            ErrorKind::PermissionDenied {
                executable,
                search_paths,
                file_mode,
            } => {
                details.insert("executable".into(), executable.as_str().into());
                if !search_paths.is_empty() {
                    details.insert("search_paths".into(), paths_value(search_paths));
                }
                if let Some(mode) = file_mode {
                    details.insert("file_mode".into(), mode.as_str().into());
                }
                details.insert(
                    "suggestions".into(),
                    suggestions::permission_denied(executable),
                );
            }
            ErrorKind::Failed(failure) => {
                insert_failure(&mut details, failure);
                details.insert("suggestions".into(), suggestions::failed(failure.exit_code));
            }
            ErrorKind::TimedOut { failure, timeout } => {
                insert_failure(&mut details, failure);
                details.insert("timeout".into(), timeout.as_secs_f64().into());
                details.insert("suggestions".into(), suggestions::timed_out());
            }
            ErrorKind::InvalidConfiguration {
                key,
                value,
                valid_values,
                ..
            } => {
                if let Some(key) = key {
                    details.insert("config_key".into(), key.as_str().into());
                }
                if let Some(value) = value {
                    details.insert("config_value".into(), value.clone());
                }
                if !valid_values.is_empty() {
                    details.insert("valid_values".into(), Value::Array(valid_values.clone()));
                }
                details.insert(
                    "suggestions".into(),
                    suggestions::invalid_configuration(key.as_deref()),
                );
            }
        }
        details
    }
}

fn insert_failure(details: &mut Details, failure: &Failure) {
    details.insert("executable".into(), failure.executable.as_str().into());
    details.insert("exit_code".into(), failure.exit_code.into());
    if !failure.args.is_empty() {
        details.insert("command_args".into(), failure.args.clone().into());
    }
    if let Some(stdout) = failure.stdout.as_deref().filter(|s| !s.is_empty()) {
        details.insert("stdout".into(), stdout.into());
    }
    if let Some(stderr) = failure.stderr.as_deref().filter(|s| !s.is_empty()) {
        details.insert("stderr".into(), stderr.into());
    }
    if let Some(elapsed) = failure.execution_time {
        details.insert("execution_time".into(), elapsed.as_secs_f64().into());
    }
}

fn paths_value(paths: &[PathBuf]) -> Value {
    Value::Array(
        paths
            .iter()
            .map(|p| Value::String(p.display().to_string()))
            .collect(),
    )
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whether constructing an error writes a diagnostic log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Diagnostics {
    /// Emit an `error` event on the `procrun::errors` target.
    #[default]
    Emit,
    /// Construct the error without logging.
    Skip,
}

/// Main error type for procrun operations.
#[derive(Error, Debug, Clone)]
#[error("{}", render_message(.message, .details))]
pub struct ExecError {
    kind: ErrorKind,
    message: String,
    details: Details,
    timestamp: DateTime<Utc>,
    #[source]
    source: Option<Arc<dyn std::error::Error + Send + Sync + 'static>>,
}

impl ExecError {
    /// Build an error of `kind` and log it.
    pub fn new(kind: ErrorKind) -> Self {
        Self::with_diagnostics(kind, Diagnostics::Emit)
    }

    /// Build an error of `kind` without logging it.
    pub fn silent(kind: ErrorKind) -> Self {
        Self::with_diagnostics(kind, Diagnostics::Skip)
    }

    pub fn with_diagnostics(kind: ErrorKind, diagnostics: Diagnostics) -> Self {
        let kind = kind.normalized();
        let error = Self {
            message: kind.message(),
            details: kind.details(),
            kind,
            timestamp: Utc::now(),
            source: None,
        };
        if diagnostics == Diagnostics::Emit {
            error.emit();
        }
        error
    }

    pub fn general(message: impl Into<String>, details: Details) -> Self {
        Self::new(ErrorKind::General {
            message: message.into(),
            details,
        })
    }

    pub fn not_found(executable: impl Into<String>, search_paths: Vec<PathBuf>) -> Self {
        Self::new(ErrorKind::NotFound {
            executable: executable.into(),
            search_paths,
        })
    }

    pub fn permission_denied(
        executable: impl Into<String>,
        search_paths: Vec<PathBuf>,
        file_mode: Option<String>,
    ) -> Self {
        Self::new(ErrorKind::PermissionDenied {
            executable: executable.into(),
            search_paths,
            file_mode,
        })
    }

    pub fn failed(failure: Failure) -> Self {
        Self::new(ErrorKind::Failed(failure))
    }

    /// A timeout. The exit code is forced to [`exit_codes::TIMEOUT_SENTINEL`]
    /// and a missing execution time defaults to `timeout`.
    pub fn timed_out(failure: Failure, timeout: Duration) -> Self {
        Self::new(ErrorKind::TimedOut { failure, timeout })
    }

    pub fn invalid_config(
        message: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self::invalid_choice(message, key, value, Vec::<Value>::new())
    }

    /// An invalid value for a key that only accepts `valid_values`.
    pub fn invalid_choice<V: Into<Value>>(
        message: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
        valid_values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::new(ErrorKind::InvalidConfiguration {
            message: message.into(),
            key: Some(key.into()),
            value: Some(value.into()),
            valid_values: valid_values.into_iter().map(Into::into).collect(),
        })
    }

    /// Add a piece of context after construction.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Attach the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    fn emit(&self) {
        tracing::error!(target: ERRORS_TARGET, error_type = self.kind.name(), "{}", self);
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// True for `Failed` and `TimedOut`.
    pub fn is_failure(&self) -> bool {
        matches!(self.kind, ErrorKind::Failed(_) | ErrorKind::TimedOut { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::TimedOut { .. })
    }

    /// True for `NotFound` and `PermissionDenied`.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::NotFound { .. } | ErrorKind::PermissionDenied { .. }
        )
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self.kind, ErrorKind::PermissionDenied { .. })
    }

    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidConfiguration { .. })
    }

    fn failure(&self) -> Option<&Failure> {
        match &self.kind {
            ErrorKind::Failed(failure) | ErrorKind::TimedOut { failure, .. } => Some(failure),
            _ => None,
        }
    }

    /// Exit code for `Failed` / `TimedOut` errors.
    pub fn exit_code(&self) -> Option<i32> {
        self.failure().map(|f| f.exit_code)
    }

    pub fn stdout(&self) -> Option<&str> {
        self.failure().and_then(|f| f.stdout.as_deref())
    }

    pub fn stderr(&self) -> Option<&str> {
        self.failure().and_then(|f| f.stderr.as_deref())
    }

    pub fn execution_time(&self) -> Option<Duration> {
        self.failure().and_then(|f| f.execution_time)
    }

    pub fn timeout(&self) -> Option<Duration> {
        match &self.kind {
            ErrorKind::TimedOut { timeout, .. } => Some(*timeout),
            _ => None,
        }
    }

    /// The executable this error is about, if any.
    pub fn executable(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::NotFound { executable, .. }
            | ErrorKind::PermissionDenied { executable, .. } => Some(executable),
            ErrorKind::Failed(failure) | ErrorKind::TimedOut { failure, .. } => {
                Some(&failure.executable)
            }
            _ => None,
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        match &self.kind {
            ErrorKind::NotFound { search_paths, .. }
            | ErrorKind::PermissionDenied { search_paths, .. } => search_paths,
            _ => &[],
        }
    }

    /// Remediation hints stored under `details["suggestions"]`.
    pub fn suggestions(&self) -> Vec<&str> {
        self.details
            .get("suggestions")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Process exit status the `procrun` binary reports for this error.
    pub fn cli_exit_code(&self) -> i32 {
        match &self.kind {
            ErrorKind::General { .. } => exit_codes::FAILURE,
            ErrorKind::NotFound { .. } => exit_codes::NOT_FOUND,
            ErrorKind::PermissionDenied { .. } => exit_codes::PERMISSION_DENIED,
            ErrorKind::Failed(failure) if (1..=255).contains(&failure.exit_code) => {
                failure.exit_code
            }
            ErrorKind::Failed(_) => exit_codes::FAILURE,
            ErrorKind::TimedOut { .. } => exit_codes::TIMED_OUT,
            ErrorKind::InvalidConfiguration { .. } => exit_codes::INVALID_CONFIGURATION,
        }
    }

    /// Serializable snapshot of this error.
    pub fn to_record(&self) -> ErrorRecord {
        ErrorRecord {
            error_type: self.kind.name().to_string(),
            message: self.message.clone(),
            details: self.details.clone(),
            timestamp: self.timestamp.timestamp_micros() as f64 / 1_000_000.0,
        }
    }
}

/// The serialized form of an [`ExecError`].
///
/// Rendering a record with `Display` gives exactly the string of the error
/// it was taken from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error_type: String,
    pub message: String,
    pub details: Details,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
}

impl ErrorRecord {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Flat `(key, value)` pairs for log sinks that cannot take nested data.
    pub fn fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("error_type".to_string(), self.error_type.clone()),
            ("message".to_string(), self.message.clone()),
        ];
        fields.extend(
            self.details
                .iter()
                .map(|(key, value)| (key.clone(), render_value(value))),
        );
        fields
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_message(&self.message, &self.details))
    }
}
