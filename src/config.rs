//! Configuration model for procrun.
//!
//! `Config` holds the defaults a [`crate::Runner`] falls back to when a call
//! does not say otherwise. It is built explicitly (`Config::default()`) or
//! from `PROCRUN_*` environment variables and handed to the runner; there is
//! no process-wide instance.
//!
//! Environment variables:
//! - `PROCRUN_DEFAULT_TIMEOUT`: timeout in seconds for runs without one
//! - `PROCRUN_MAX_OUTPUT_SIZE`: captured-output size (bytes) above which a
//!   warning is logged; output is never truncated
//! - `PROCRUN_LOG_LEVEL`: error, warn, info, debug or trace
//! - `PROCRUN_SEARCH_PATHS`: extra executable directories, searched before PATH

use crate::error::{ExecError, Result};
use crate::logging::{CONFIG_TARGET, LogLevel};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_VAR: &str = "PROCRUN_DEFAULT_TIMEOUT";
pub const MAX_OUTPUT_SIZE_VAR: &str = "PROCRUN_MAX_OUTPUT_SIZE";
pub const LOG_LEVEL_VAR: &str = "PROCRUN_LOG_LEVEL";
pub const SEARCH_PATHS_VAR: &str = "PROCRUN_SEARCH_PATHS";

/// Default advisory output limit: 10 MiB.
pub const DEFAULT_MAX_OUTPUT_SIZE: u64 = 10 * 1024 * 1024;

/// Runner defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Timeout applied when a run does not set one. `None` waits forever.
    pub default_timeout: Option<Duration>,

    /// Captured output above this many bytes is logged as a warning.
    pub max_output_size: u64,

    /// Level the `procrun` binary logs at unless overridden on the CLI.
    pub log_level: LogLevel,

    /// Directories searched for executables before PATH.
    pub search_paths: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_timeout: None,
            max_output_size: DEFAULT_MAX_OUTPUT_SIZE,
            log_level: LogLevel::default(),
            search_paths: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from `PROCRUN_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(ExecError)` - InvalidConfiguration naming the offending variable
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load config reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(raw) = lookup(DEFAULT_TIMEOUT_VAR) {
            let seconds: f64 = raw.trim().parse().map_err(|_| {
                ExecError::invalid_config(
                    format!("Invalid value for {}: must be a number of seconds", DEFAULT_TIMEOUT_VAR),
                    "default_timeout",
                    raw.as_str(),
                )
            })?;
            config.default_timeout = Some(positive_seconds(seconds, "default_timeout")?);
        }

        if let Some(raw) = lookup(MAX_OUTPUT_SIZE_VAR) {
            config.max_output_size = raw.trim().parse().map_err(|_| {
                ExecError::invalid_config(
                    format!("Invalid value for {}: must be an integer", MAX_OUTPUT_SIZE_VAR),
                    "max_output_size",
                    raw.as_str(),
                )
            })?;
        }

        if let Some(raw) = lookup(LOG_LEVEL_VAR) {
            config.log_level = raw.parse().map_err(|_| {
                ExecError::invalid_choice(
                    format!(
                        "log_level must be one of: {}",
                        LogLevel::VALID_NAMES.join(", ")
                    ),
                    "log_level",
                    raw.as_str(),
                    LogLevel::VALID_NAMES,
                )
            })?;
        }

        if let Some(raw) = lookup(SEARCH_PATHS_VAR) {
            config.search_paths = std::env::split_paths(&raw)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }

        tracing::debug!(
            target: CONFIG_TARGET,
            default_timeout = ?config.default_timeout,
            max_output_size = config.max_output_size,
            log_level = ?config.log_level,
            search_paths = config.search_paths.len(),
            "loaded configuration from environment"
        );

        config.validate()?;
        Ok(config)
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `default_timeout`, when set, must be positive
    /// - `max_output_size` must be positive
    /// - `search_paths` entries that exist must be directories
    ///
    /// Search paths that do not exist are accepted; the runner warns about
    /// them when it is created.
    pub fn validate(&self) -> Result<()> {
        if let Some(timeout) = self.default_timeout {
            if timeout.is_zero() {
                return Err(ExecError::invalid_config(
                    "default_timeout must be positive",
                    "default_timeout",
                    timeout.as_secs_f64(),
                ));
            }
        }

        if self.max_output_size == 0 {
            return Err(ExecError::invalid_config(
                "max_output_size must be a positive integer",
                "max_output_size",
                self.max_output_size,
            ));
        }

        for path in &self.search_paths {
            if path.exists() && !path.is_dir() {
                return Err(ExecError::invalid_config(
                    format!("Search path must be a directory: {}", path.display()),
                    "search_paths",
                    path.display().to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    pub fn with_max_output_size(mut self, bytes: u64) -> Self {
        self.max_output_size = bytes;
        self
    }
}

/// Convert a caller-supplied number of seconds, rejecting zero, negative and
/// non-finite values as well as values a `Duration` cannot hold.
pub(crate) fn positive_seconds(seconds: f64, key: &str) -> Result<Duration> {
    let invalid = |message: String| {
        let value = serde_json::Number::from_f64(seconds)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(seconds.to_string()));
        ExecError::invalid_choice(message, key, value, ["positive number of seconds"])
    };

    if seconds.is_nan() || seconds <= 0.0 {
        return Err(invalid(format!("{} must be positive", key)));
    }

    match Duration::try_from_secs_f64(seconds) {
        Ok(duration) if !duration.is_zero() => Ok(duration),
        Ok(_) => Err(invalid(format!(
            "{} out of range: below one nanosecond",
            key
        ))),
        Err(_) => Err(invalid(format!("{} out of range: too large", key))),
    }
}
