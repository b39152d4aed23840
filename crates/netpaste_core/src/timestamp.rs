//! Timestamp rendering.
//!
//! Timestamps are opaque strings to the rest of the crate. They are rendered
//! as `YYYY-MM-DD HH:MM:SS` in UTC.

use time::macros::format_description;
use time::OffsetDateTime;

/// Fallback used if formatting ever fails.
const EPOCH: &str = "1970-01-01 00:00:00";

/// Returns the current time as a display string.
#[must_use]
pub fn now() -> String {
    format(OffsetDateTime::now_utc())
}

/// Renders `at` as a display string.
#[must_use]
pub fn format(at: OffsetDateTime) -> String {
    at.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
    .unwrap_or_else(|_| EPOCH.to_string())
}
