//! Canonical timestamp layout for `last_processed` values.
//!
//! Timestamps are persisted as UTC text with second precision, e.g.
//! `2024-03-01T12:30:05Z`. Sub-second precision is dropped on format.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::HavocError;

/// `strftime` layout for persisted timestamps.
pub const TIMESTAMP_LAYOUT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Format an instant in the canonical layout.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_LAYOUT).to_string()
}

/// Parse a canonical timestamp. Any other layout (offsets, fractional
/// seconds, date-only) is rejected.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, HavocError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_LAYOUT)
        .map(|naive| naive.and_utc())
        .map_err(|_| HavocError::InvalidTimestamp(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_drops_subseconds() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap()
            + chrono::Duration::milliseconds(750);
        assert_eq!(format_timestamp(at), "2024-03-01T12:30:05Z");
    }

    #[test]
    fn parse_accepts_canonical_layout() {
        let parsed = parse_timestamp("2024-03-01T12:30:05Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap());
    }

    #[test]
    fn parse_rejects_other_layouts() {
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("not a time").is_err());
        assert!(parse_timestamp("2024-03-01").is_err());
        assert!(parse_timestamp("2024-03-01T12:30:05+00:00").is_err());
        assert!(parse_timestamp("2024-03-01 12:30:05").is_err());
    }

    #[test]
    fn format_then_parse_is_stable() {
        let at = Utc.with_ymd_and_hms(1999, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(at)).unwrap(), at);
    }
}
