//! Bounded waiting on a child process.

use crate::exit_codes;
use std::io;
use std::process::{Child, ExitStatus};
use std::time::{Duration, Instant};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);
const MAX_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Outcome {
    Exited(i32),
    TimedOut,
}

/// Wait for `child`, killing it once `timeout` has passed.
///
/// Without a timeout this blocks until the child exits. With one, the child
/// is polled; the interval starts short so quick commands return quickly
/// and backs off for long-running ones.
pub(super) fn wait_with_timeout(child: &mut Child, timeout: Option<Duration>) -> io::Result<Outcome> {
    let Some(timeout) = timeout else {
        return child.wait().map(|status| Outcome::Exited(exit_code(status)));
    };

    let start = Instant::now();
    let mut interval = MIN_POLL_INTERVAL;

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Outcome::Exited(exit_code(status))),
            Ok(None) => {
                let elapsed = start.elapsed();
                if elapsed >= timeout {
                    kill_process(child);
                    return Ok(Outcome::TimedOut);
                }
                std::thread::sleep(interval.min(timeout - elapsed));
                interval = (interval * 2).min(MAX_POLL_INTERVAL);
            }
            Err(e) => {
                kill_process(child);
                return Err(e);
            }
        }
    }
}

/// Kill a process and reap it.
fn kill_process(child: &mut Child) {
    // SIGKILL on Unix, TerminateProcess on Windows.
    let _ = child.kill();
    let _ = child.wait();
}

/// Exit status as an integer; signals map to `128 + signal`.
#[cfg(unix)]
pub(super) fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => exit_codes::SIGNAL_BASE + signal,
        (None, None) => exit_codes::FAILURE,
    }
}

#[cfg(not(unix))]
pub(super) fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(exit_codes::FAILURE)
}
