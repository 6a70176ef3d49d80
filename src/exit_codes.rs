//! Exit code constants for procrun.
//!
//! Two groups live here:
//! - sentinels stored in `ExecutionResult`/`ExecError` exit codes when no real
//!   process exit status exists (timeout, OS launch failure)
//! - process exit statuses used by the `procrun` binary:
//!   - 0: Success
//!   - 1: Command failed (non-zero exit or OS launch failure)
//!   - 2: Invalid configuration or arguments
//!   - 124: Command timed out
//!   - 126: Executable found but not executable
//!   - 127: Executable not found

/// Exit code recorded when a command was killed for exceeding its timeout.
pub const TIMEOUT_SENTINEL: i32 = -1;

/// Exit code recorded when the OS refused to start the command.
pub const OS_ERROR_SENTINEL: i32 = -2;

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// The command ran and failed, or could not be launched.
pub const FAILURE: i32 = 1;

/// Invalid configuration: bad options, environment variables or CLI flags.
pub const INVALID_CONFIGURATION: i32 = 2;

/// The command was terminated after exceeding its timeout.
pub const TIMED_OUT: i32 = 124;

/// The executable exists but carries no execute permission.
pub const PERMISSION_DENIED: i32 = 126;

/// The executable could not be resolved.
pub const NOT_FOUND: i32 = 127;

/// Offset added to a signal number when a child is killed by a signal.
pub const SIGNAL_BASE: i32 = 128;
