//! Display helpers
//!
//! Formatting shared by surfaces so every front end renders turns the same
//! way.

use std::time::Duration;

use chrono::{DateTime, Local};

/// Format a response time: `"<n>ms"` below one second, else `"<n.n>s"`
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

/// Format a turn timestamp as hours and minutes (`HH:MM`)
#[must_use]
pub fn format_timestamp(timestamp: &DateTime<Local>) -> String {
    timestamp.format("%H:%M").to_string()
}

/// Split turn text into newline-delimited blocks
///
/// Each line is rendered as its own block; empty lines are kept.
pub fn text_blocks(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
}
