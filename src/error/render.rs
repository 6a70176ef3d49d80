//! String rendering for error messages and detail values.

use super::Details;
use serde_json::Value;

/// Render `message` followed by its details as `(context: k=v, k=v)`.
///
/// Details keep their insertion order, so the output is deterministic.
pub fn render_message(message: &str, details: &Details) -> String {
    if details.is_empty() {
        return message.to_string();
    }

    let context = details
        .iter()
        .map(|(key, value)| format!("{}={}", key, render_value(value)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} (context: {})", message, context)
}

/// Render a single detail value for humans.
///
/// Strings are written raw; lists and maps are bracketed with their items
/// rendered recursively.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(render_value).collect::<Vec<_>>().join(", ")
        ),
        Value::Object(map) => format!(
            "{{{}}}",
            map.iter()
                .map(|(key, value)| format!("{}: {}", key, render_value(value)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        other => other.to_string(),
    }
}
