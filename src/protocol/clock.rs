//! Wall-clock timestamps as stamped on the wire.

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch.
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Render a timestamp the way every hop appends it.
pub fn format_secs(secs: f64) -> String {
    format!("{:.6}", secs)
}
