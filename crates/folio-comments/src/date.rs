//! Timestamp display

use chrono::{DateTime, Utc};

/// Display format for comment timestamps, e.g. `Sep 13, 2020`
pub const DISPLAY_FORMAT: &str = "%b %-d, %Y";

/// Format milliseconds since the epoch (UTC)
///
/// Returns `None` when the value is outside the representable range.
#[must_use]
pub fn format_millis(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.format(DISPLAY_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_known_instant() {
        assert_eq!(
            format_millis(1_600_000_000_000).as_deref(),
            Some("Sep 13, 2020")
        );
        assert_eq!(format_millis(0).as_deref(), Some("Jan 1, 1970"));
    }

    #[test]
    fn deterministic() {
        assert_eq!(format_millis(1_234_567_890_123), format_millis(1_234_567_890_123));
    }

    #[test]
    fn out_of_range_is_none() {
        assert!(format_millis(i64::MAX).is_none());
    }
}
