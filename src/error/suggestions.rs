//! Remediation hints attached to each error kind.

use serde_json::Value;

fn list(items: Vec<String>) -> Value {
    Value::Array(items.into_iter().map(Value::String).collect())
}

pub(super) fn not_found(executable: &str) -> Value {
    list(vec![
        format!("Install '{}' or check that the name is spelled correctly", executable),
        "Make sure the directory containing the executable is listed in PATH".to_string(),
        "Pass an absolute path to the executable instead of a bare name".to_string(),
    ])
}

pub(super) fn permission_denied(executable: &str) -> Value {
    list(vec![
        format!("Make the file executable: chmod +x {}", executable),
        "Check the file permissions and ownership".to_string(),
        "Run with elevated privileges (sudo) if the file is meant to be restricted".to_string(),
    ])
}

pub(super) fn failed(exit_code: i32) -> Value {
    list(vec![
        "Verify that the command arguments are correct".to_string(),
        "Inspect stderr for the underlying error".to_string(),
        format!(
            "Consult the executable's documentation for the meaning of exit code {}",
            exit_code
        ),
    ])
}

pub(super) fn timed_out() -> Value {
    list(vec![
        "Increase the timeout if the command legitimately needs more time".to_string(),
        "Check whether the process is hanging or waiting for input".to_string(),
        "Run the command manually to observe where it stalls".to_string(),
    ])
}

pub(super) fn invalid_configuration(key: Option<&str>) -> Value {
    let first = match key {
        Some(key) => format!("Review the configuration value for '{}'", key),
        None => "Review the supplied configuration values".to_string(),
    };
    list(vec![
        first,
        "Check environment variables that override configuration (PROCRUN_*)".to_string(),
        "See the documentation for accepted values".to_string(),
    ])
}
