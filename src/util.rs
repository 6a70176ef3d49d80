//! Human-readable formatting helpers used in log lines and CLI output.

/// Format a duration in seconds with a unit that fits its size.
///
/// `0.001234` → `1.23ms`, `1.5` → `1.50s`, `61.2` → `1m 1.20s`,
/// `3661.5` → `1h 1m 1.50s`. Negative and zero durations render as `0.00s`.
pub fn format_duration(seconds: f64) -> String {
    if seconds <= 0.0 || seconds.is_nan() {
        return "0.00s".to_string();
    }
    if seconds < 0.001 {
        return format!("{:.0}μs", seconds * 1_000_000.0);
    }
    if seconds < 1.0 {
        return format!("{:.2}ms", seconds * 1000.0);
    }
    if seconds < 60.0 {
        return format!("{:.2}s", seconds);
    }
    if seconds < 3600.0 {
        let minutes = (seconds / 60.0).floor();
        return format!("{}m {:.2}s", minutes as u64, seconds - minutes * 60.0);
    }

    let hours = (seconds / 3600.0).floor();
    let remaining = seconds - hours * 3600.0;
    let minutes = (remaining / 60.0).floor();
    format!(
        "{}h {}m {:.2}s",
        hours as u64,
        minutes as u64,
        remaining - minutes * 60.0
    )
}

/// Format a byte count using 1024-based units.
///
/// `512` → `512 B`, `1536` → `1.50 KB`, `1048576` → `1.00 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit])
    }
}
