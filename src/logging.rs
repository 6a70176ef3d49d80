//! Logging setup for procrun using `tracing` + `tracing-subscriber`.
//!
//! The library only emits events. Installing a subscriber is left to the
//! application; the `procrun` binary calls [`init_logging`] once at startup.
//!
//! Named loggers are `tracing` targets under the `procrun` prefix:
//! - `procrun::runner` - process launch, completion, timeouts
//! - `procrun::resolve` - executable lookup
//! - `procrun::errors` - one event per constructed error
//! - `procrun::config` - configuration loading
//! - `procrun::perf` - [`PerfTimer`] measurements
//!
//! Console output goes to STDERR so that stdout stays free for command output.

use crate::error::{ExecError, Result};
use crate::util::format_duration;
use clap::ValueEnum;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{Level, Metadata};
use tracing_subscriber::filter::{FilterFn, LevelFilter, filter_fn};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub const TARGET_PREFIX: &str = "procrun";
pub const RUNNER_TARGET: &str = "procrun::runner";
pub const RESOLVE_TARGET: &str = "procrun::resolve";
pub const ERRORS_TARGET: &str = "procrun::errors";
pub const CONFIG_TARGET: &str = "procrun::config";
pub const PERF_TARGET: &str = "procrun::perf";

/// Map a short logger name to its full target.
///
/// `"root"` names the prefix itself; names already under the prefix are
/// returned unchanged.
pub fn target(name: &str) -> String {
    if name == "root" || name == TARGET_PREFIX {
        TARGET_PREFIX.to_string()
    } else if name.starts_with("procrun::") {
        name.to_string()
    } else {
        format!("{}::{}", TARGET_PREFIX, name)
    }
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Names accepted by [`LogLevel::from_str`], for error messages.
    pub const VALID_NAMES: [&'static str; 7] = [
        "error", "warn", "warning", "info", "debug", "trace", "critical",
    ];

    pub fn as_level(self) -> Level {
        match self {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }

    pub fn as_filter(self) -> LevelFilter {
        LevelFilter::from_level(self.as_level())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" | "critical" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!(
                "invalid log level: {other} (expected one of: {})",
                Self::VALID_NAMES.join(", ")
            )),
        }
    }
}

/// Layout of each log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Timestamp, level, target and message.
    #[default]
    Simple,
    /// Adds source file, line number and thread name.
    Detailed,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(LogFormat::Simple),
            "detailed" => Ok(LogFormat::Detailed),
            other => Err(format!(
                "invalid log format: {other} (expected \"simple\" or \"detailed\")"
            )),
        }
    }
}

/// Everything [`init_logging`] needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Append log lines to this file as well.
    pub file: Option<PathBuf>,
    /// Write log lines to stderr.
    pub console: bool,
    /// Include `procrun::errors` events in the stderr output. Applications
    /// that print errors themselves turn this off; the log file keeps them.
    pub console_errors: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            file: None,
            console: true,
            console_errors: true,
        }
    }
}

impl LogSettings {
    /// Read `PROCRUN_LOG_FORMAT`, `PROCRUN_LOG_FILE` and `PROCRUN_LOG_CONSOLE`.
    ///
    /// The level is owned by [`crate::Config`]; see [`LogSettings::with_level`].
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`LogSettings::from_env`], reading through `lookup`.
    ///
    /// Unknown formats fall back to simple; console stays on unless the
    /// variable is exactly `false` (any case).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let format = lookup("PROCRUN_LOG_FORMAT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.format);
        let file = lookup("PROCRUN_LOG_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);
        let console = lookup("PROCRUN_LOG_CONSOLE")
            .map(|s| !s.trim().eq_ignore_ascii_case("false"))
            .unwrap_or(defaults.console);

        Self {
            format,
            file,
            console,
            ..defaults
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_console_errors(mut self, enabled: bool) -> Self {
        self.console_errors = enabled;
        self
    }
}

/// Install the global logging subscriber.
///
/// Call once at startup. Fails if the log file cannot be opened or a global
/// subscriber is already installed.
pub fn init_logging(settings: &LogSettings) -> Result<()> {
    let file = match &settings.file {
        Some(path) => Some(open_log_file(path)?),
        None => None,
    };
    let detailed = settings.format == LogFormat::Detailed;

    let console_layer = settings.console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(detailed)
            .with_line_number(detailed)
            .with_thread_names(detailed)
            .with_filter(error_events(settings.console_errors))
    });
    let file_layer = file.map(|file| {
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_file(detailed)
            .with_line_number(detailed)
            .with_thread_names(detailed)
    });

    tracing_subscriber::registry()
        .with(settings.level.as_filter())
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| {
            ExecError::general(
                format!("failed to install logging subscriber: {}", e),
                Default::default(),
            )
            .with_source(e)
        })?;

    tracing::debug!(
        target: TARGET_PREFIX,
        level = ?settings.level,
        format = ?settings.format,
        console = settings.console,
        file = ?settings.file,
        "logging configured"
    );
    Ok(())
}

/// Per-layer filter that drops `procrun::errors` events unless `include`.
fn error_events(include: bool) -> FilterFn<impl Fn(&Metadata<'_>) -> bool> {
    filter_fn(move |metadata| include || metadata.target() != ERRORS_TARGET)
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            ExecError::invalid_config(
                format!(
                    "failed to create log directory '{}': {}",
                    parent.display(),
                    e
                ),
                "log_file",
                path.display().to_string(),
            )
        })?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            ExecError::invalid_config(
                format!("failed to open log file '{}': {}", path.display(), e),
                "log_file",
                path.display().to_string(),
            )
        })
}

/// Times an operation and logs the duration at `debug` on `procrun::perf`.
///
/// The clock is only read when that level is enabled, so an unused timer
/// costs one level check. Logs on [`PerfTimer::finish`] or on drop.
#[derive(Debug)]
pub struct PerfTimer {
    operation: String,
    threshold: Duration,
    start: Option<Instant>,
}

impl PerfTimer {
    /// Default minimum duration worth logging.
    pub const DEFAULT_THRESHOLD: Duration = Duration::from_millis(10);

    pub fn start(operation: impl Into<String>) -> Self {
        let start = tracing::enabled!(target: PERF_TARGET, Level::DEBUG).then(Instant::now);
        Self {
            operation: operation.into(),
            threshold: Self::DEFAULT_THRESHOLD,
            start,
        }
    }

    /// Only log runs that take at least `threshold`.
    pub fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    /// Whether the timer is measuring (debug enabled when it started).
    pub fn is_active(&self) -> bool {
        self.start.is_some()
    }

    /// Stop the timer; returns the elapsed time when it was active.
    pub fn finish(mut self) -> Option<Duration> {
        self.report()
    }

    fn report(&mut self) -> Option<Duration> {
        let elapsed = self.start.take()?.elapsed();
        if elapsed >= self.threshold {
            tracing::debug!(
                target: PERF_TARGET,
                operation = %self.operation,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                "{} completed in {}",
                self.operation,
                format_duration(elapsed.as_secs_f64())
            );
        }
        Some(elapsed)
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        self.report();
    }
}
