//! procrun: run external executables with timeouts, output capture and
//! structured errors.
//!
//! ```no_run
//! use procrun::{RunOptions, run};
//! use std::time::Duration;
//!
//! let options = RunOptions::new()
//!     .arg("Hello, World!")
//!     .timeout(Duration::from_secs(5));
//! let result = run("echo", &options)?;
//! assert!(result.success());
//! # Ok::<(), procrun::ExecError>(())
//! ```

pub mod config;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod resolve;
pub mod result;
pub mod runner;
pub mod util;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::{Details, Diagnostics, ErrorKind, ErrorRecord, ExecError, Failure, Result};
pub use resolve::resolve_executable;
pub use result::ExecutionResult;
pub use runner::{RunOptions, Runner, run};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One-line usage banner printed by `procrun` without a subcommand.
pub fn banner() -> String {
    format!(
        "procrun v{} - usage: procrun run <executable> [args...]",
        VERSION
    )
}
