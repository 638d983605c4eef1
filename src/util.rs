use std::time::Duration;

use chrono::{DateTime, FixedOffset};

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1_024;
    const MB: u64 = KB * 1_024;
    const GB: u64 = MB * 1_024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Age of a snapshot rounded down to minutes, e.g. "3days 4h 12m".
/// Timestamps in the future render as "just now".
pub fn format_age(now: DateTime<FixedOffset>, then: DateTime<FixedOffset>) -> String {
    let minutes = (now - then).num_minutes();
    if minutes <= 0 {
        return "just now".to_string();
    }

    let secs = (minutes as u64).saturating_mul(60);
    humantime::format_duration(Duration::from_secs(secs)).to_string()
}
