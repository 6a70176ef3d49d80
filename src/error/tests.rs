//! Tests for the error taxonomy.

use super::*;
use crate::exit_codes;
use crate::test_support::LogCapture;
use serde_json::json;
use std::time::Duration;

fn sample_failure() -> Failure {
    Failure::new("failing-command", 3)
        .with_args(vec!["--verbose".into(), "input.txt".into()])
        .with_stderr(Some("boom".into()))
        .with_execution_time(Duration::from_millis(250))
}

#[test]
fn general_error_renders_message_and_context() {
    let mut details = Details::new();
    details.insert("key".into(), json!("value"));
    details.insert("number".into(), json!(42));

    let err = ExecError::general("Test error message", details);

    assert_eq!(
        err.to_string(),
        "Test error message (context: key=value, number=42)"
    );
    assert_eq!(err.kind().name(), "Error");
}

#[test]
fn general_error_without_details_is_just_the_message() {
    let err = ExecError::general("plain", Details::new());
    assert_eq!(err.to_string(), "plain");
}

#[test]
fn not_found_lists_search_paths_and_suggestions() {
    let paths = vec![
        PathBuf::from("/usr/bin"),
        PathBuf::from("/usr/local/bin"),
        PathBuf::from("/opt/bin"),
    ];
    let err = ExecError::not_found("missing-tool", paths);

    let text = err.to_string();
    assert!(text.contains("PATH or specified location"));
    assert!(text.contains("searched: /usr/bin, /usr/local/bin, /opt/bin"));
    assert!(err.is_not_found());
    assert!(!err.is_permission_denied());
    assert_eq!(err.executable(), Some("missing-tool"));
    assert_eq!(err.search_paths().len(), 3);
    assert_eq!(
        err.details()["search_paths"],
        json!(["/usr/bin", "/usr/local/bin", "/opt/bin"])
    );

    let suggestions = err.suggestions();
    assert!(suggestions.iter().any(|s| s.to_lowercase().contains("install")));
    assert!(suggestions.iter().any(|s| s.contains("PATH")));
    assert!(suggestions.iter().any(|s| s.contains("absolute")));
}

#[test]
fn permission_denied_is_a_not_found_variant() {
    let err = ExecError::permission_denied(
        "/usr/local/bin/restricted-tool",
        vec![PathBuf::from("/usr/local/bin")],
        Some("644".into()),
    );

    assert!(err.is_not_found());
    assert!(err.is_permission_denied());
    assert!(err.to_string().contains("Permission denied"));
    assert!(err.to_string().contains("/usr/local/bin/restricted-tool"));
    assert_eq!(err.details()["file_mode"], json!("644"));

    let suggestions = err.suggestions();
    assert!(suggestions.iter().any(|s| s.contains("chmod")));
    assert!(suggestions.iter().any(|s| s.to_lowercase().contains("sudo")));
    assert!(suggestions.iter().any(|s| s.to_lowercase().contains("permissions")));
}

#[test]
fn failed_error_carries_execution_context() {
    let err = ExecError::failed(sample_failure());

    assert!(err.is_failure());
    assert!(!err.is_timeout());
    assert_eq!(err.exit_code(), Some(3));
    assert_eq!(err.stderr(), Some("boom"));
    assert_eq!(err.stdout(), None);
    assert_eq!(err.execution_time(), Some(Duration::from_millis(250)));
    assert_eq!(
        err.message(),
        "Command 'failing-command --verbose input.txt' failed with exit code 3"
    );

    let details = err.details();
    assert_eq!(details["executable"], json!("failing-command"));
    assert_eq!(details["exit_code"], json!(3));
    assert_eq!(details["command_args"], json!(["--verbose", "input.txt"]));
    assert_eq!(details["execution_time"], json!(0.25));
    assert!(!details.contains_key("stdout"));

    let suggestions = err.suggestions();
    assert!(suggestions.iter().any(|s| s.contains("arguments")));
    assert!(suggestions.iter().any(|s| s.contains("stderr")));
    assert!(suggestions.iter().any(|s| s.contains("documentation")));
}

#[test]
fn failed_error_string_contains_exit_code_context() {
    let err = ExecError::silent(ErrorKind::Failed(Failure::new("test-cmd", 1)));
    let text = err.to_string();

    assert!(text.contains("context:"));
    assert!(text.contains("executable=test-cmd"));
    assert!(text.contains("exit_code=1"));
}

#[test]
fn empty_output_is_left_out_of_details() {
    let failure = Failure::new("cmd", 1)
        .with_stdout(Some(String::new()))
        .with_stderr(Some(String::new()));
    let err = ExecError::silent(ErrorKind::Failed(failure));

    assert_eq!(err.stdout(), Some(""));
    assert!(!err.details().contains_key("stdout"));
    assert!(!err.details().contains_key("stderr"));
}

#[test]
fn timed_out_forces_sentinel_exit_code() {
    let failure = Failure::new("test-cmd", 0).with_args(vec!["--arg".into()]);
    let err = ExecError::timed_out(failure, Duration::from_secs(30));

    assert!(err.is_timeout());
    assert!(err.is_failure());
    assert_eq!(err.exit_code(), Some(exit_codes::TIMEOUT_SENTINEL));
    assert!(err.message().to_lowercase().contains("timed out"));
    assert!(err.to_string().contains("test-cmd --arg"));
    assert!(err.to_string().contains("30.0 seconds"));
}

#[test]
fn timed_out_execution_time_defaults_to_timeout() {
    let err = ExecError::silent(ErrorKind::TimedOut {
        failure: Failure::new("test-cmd", 0),
        timeout: Duration::from_secs(30),
    });

    assert_eq!(err.execution_time(), Some(Duration::from_secs(30)));
    assert_eq!(err.timeout(), Some(Duration::from_secs(30)));
}

#[test]
fn timed_out_keeps_explicit_execution_time_and_partial_output() {
    let failure = Failure::new("test-cmd", 0)
        .with_stdout(Some("output".into()))
        .with_stderr(Some("error".into()))
        .with_execution_time(Duration::from_secs_f64(25.5));
    let err = ExecError::silent(ErrorKind::TimedOut {
        failure,
        timeout: Duration::from_secs(30),
    });

    assert_eq!(err.stdout(), Some("output"));
    assert_eq!(err.stderr(), Some("error"));

    let details = &err.to_record().details;
    assert_eq!(details["exit_code"], json!(-1));
    assert_eq!(details["execution_time"], json!(25.5));
    assert_eq!(details["timeout"], json!(30.0));

    let suggestions = err.suggestions();
    assert!(suggestions.iter().any(|s| s.to_lowercase().contains("timeout")));
    assert!(suggestions.iter().any(|s| s.to_lowercase().contains("hanging")));
}

#[test]
fn invalid_choice_records_key_value_and_valid_set() {
    let valid = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];
    let err = ExecError::invalid_choice("Invalid log level", "log_level", "INVALID", valid);

    assert!(err.is_invalid_configuration());
    let details = err.details();
    assert_eq!(details["config_key"], json!("log_level"));
    assert_eq!(details["config_value"], json!("INVALID"));
    assert_eq!(details["valid_values"], json!(valid));

    let suggestions = err.suggestions();
    assert!(suggestions.iter().any(|s| s.to_lowercase().contains("configuration")));
    assert!(suggestions.iter().any(|s| s.to_lowercase().contains("environment")));
    assert!(suggestions.iter().any(|s| s.to_lowercase().contains("documentation")));
}

#[test]
fn to_record_exposes_type_message_details_and_timestamp() {
    let mut details = Details::new();
    details.insert("key".into(), json!("value"));
    let before = Utc::now().timestamp() as f64 - 1.0;

    let err = ExecError::silent(ErrorKind::General {
        message: "Test error message".into(),
        details: details.clone(),
    });
    let record = err.to_record();

    assert_eq!(record.error_type, "Error");
    assert_eq!(record.message, "Test error message");
    assert_eq!(record.details, details);
    assert!(record.timestamp > before);
}

#[test]
fn record_renders_exactly_like_the_error() {
    let errors = vec![
        ExecError::silent(ErrorKind::Failed(sample_failure())),
        ExecError::silent(ErrorKind::NotFound {
            executable: "ghost".into(),
            search_paths: vec![PathBuf::from("/bin")],
        }),
        ExecError::silent(ErrorKind::TimedOut {
            failure: Failure::new("sleep", 0).with_stdout(Some("partial".into())),
            timeout: Duration::from_millis(500),
        }),
        ExecError::invalid_config("timeout must be positive", "timeout", -1.0),
    ];

    for err in errors {
        let record = err.to_record();
        assert_eq!(record.to_string(), err.to_string());

        let json = record.to_json().unwrap();
        let restored = ErrorRecord::from_json(&json).unwrap();
        assert_eq!(restored.to_string(), err.to_string());
        assert_eq!(restored.error_type, err.kind().name());
    }
}

#[test]
fn record_round_trip_keeps_measured_execution_times() {
    // Nanosecond-precision times whose shortest float form is easy to lose.
    let mut nanos: Vec<u64> = vec![2_654_435_761, 1_000_000_001, 123_456_789_123];
    nanos.extend((0..2_000u64).map(|i| 2_654_435_761 + i * 7_919));

    for k in nanos {
        let err = ExecError::silent(ErrorKind::Failed(
            Failure::new("measured", 1).with_execution_time(Duration::from_nanos(k)),
        ));

        let json = err.to_record().to_json().unwrap();
        let restored = ErrorRecord::from_json(&json).unwrap();
        assert_eq!(restored.to_string(), err.to_string(), "{k}ns");
        assert_eq!(
            restored.details["execution_time"],
            err.details()["execution_time"]
        );
    }
}

#[test]
fn record_fields_are_flat_strings() {
    let err = ExecError::silent(ErrorKind::Failed(sample_failure()));
    let fields = err.to_record().fields();

    assert_eq!(fields[0], ("error_type".to_string(), "Failed".to_string()));
    assert!(fields.contains(&(
        "command_args".to_string(),
        "[--verbose, input.txt]".to_string()
    )));
    assert!(fields.contains(&("exit_code".to_string(), "3".to_string())));
}

#[test]
fn context_survives_rewrapping() {
    let inner = ExecError::not_found("deep-command", vec![PathBuf::from("/deep/path")]);
    let wrapped = ExecError::general(
        format!("Failed in level2: {}", inner.message()),
        inner.details().clone(),
    )
    .with_detail("call_level", "level2")
    .with_source(inner);

    let details = &wrapped.to_record().details;
    assert!(details.contains_key("call_level"));
    assert!(details.contains_key("executable"));

    let source = std::error::Error::source(&wrapped).expect("source should be kept");
    assert!(source.to_string().contains("deep-command"));
}

#[test]
fn cli_exit_codes_follow_error_kind() {
    assert_eq!(
        ExecError::not_found("x", vec![]).cli_exit_code(),
        exit_codes::NOT_FOUND
    );
    assert_eq!(
        ExecError::permission_denied("x", vec![], None).cli_exit_code(),
        exit_codes::PERMISSION_DENIED
    );
    assert_eq!(
        ExecError::failed(Failure::new("x", 3)).cli_exit_code(),
        3
    );
    assert_eq!(
        ExecError::failed(Failure::new("x", exit_codes::OS_ERROR_SENTINEL)).cli_exit_code(),
        exit_codes::FAILURE
    );
    assert_eq!(
        ExecError::timed_out(Failure::new("x", 0), Duration::from_secs(1)).cli_exit_code(),
        exit_codes::TIMED_OUT
    );
    assert_eq!(
        ExecError::invalid_config("bad", "k", "v").cli_exit_code(),
        exit_codes::INVALID_CONFIGURATION
    );
}

#[test]
fn emit_logs_to_errors_target_and_skip_stays_quiet() {
    let logs = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::ERROR)
        .with_ansi(false)
        .with_writer(logs.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        ExecError::new(ErrorKind::General {
            message: "emitted failure".into(),
            details: Details::new(),
        });
        ExecError::silent(ErrorKind::General {
            message: "skipped failure".into(),
            details: Details::new(),
        });
        ExecError::with_diagnostics(
            ErrorKind::General {
                message: "also skipped".into(),
                details: Details::new(),
            },
            Diagnostics::Skip,
        );
    });

    let output = logs.contents();
    assert!(output.contains("emitted failure"), "{output}");
    assert!(output.contains(ERRORS_TARGET), "{output}");
    assert!(!output.contains("skipped failure"), "{output}");
    assert!(!output.contains("also skipped"), "{output}");
}

#[test]
fn silent_and_logged_errors_are_otherwise_identical() {
    let logged = ExecError::new(ErrorKind::Failed(sample_failure()));
    let silent = ExecError::silent(ErrorKind::Failed(sample_failure()));

    assert_eq!(logged.to_string(), silent.to_string());
    assert_eq!(logged.kind(), silent.kind());
    assert_eq!(logged.details(), silent.details());
}
