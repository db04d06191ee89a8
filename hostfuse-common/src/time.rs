//! Timestamp utilities

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parse a vendor timestamp string into a UTC instant
///
/// Accepts RFC 3339 (any offset), naive ISO datetimes (read as UTC), and bare
/// `YYYY-MM-DD` dates (midnight UTC). Returns `None` when nothing matches.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    // Offsets written without a colon (+0000)
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Convert epoch milliseconds to a UTC instant
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = parse_timestamp("2024-03-01T12:00:00+02:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_parse_zulu_with_fraction() {
        let dt = parse_timestamp("2024-03-01T12:00:00.250Z").unwrap();
        assert_eq!(dt.timestamp_millis() % 1000, 250);
    }

    #[test]
    fn test_parse_offset_without_colon() {
        let dt = parse_timestamp("2024-01-01T00:00:00.000+0000").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-01T00:00:00+00:00");

        let shifted = parse_timestamp("2024-01-01T02:00:00+0200").unwrap();
        assert_eq!(shifted, dt);
    }

    #[test]
    fn test_parse_naive_datetime_as_utc() {
        let dt = parse_timestamp("2024-03-01T12:00:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-01T12:00:00+00:00");

        let spaced = parse_timestamp("2024-03-01 12:00:00").unwrap();
        assert_eq!(spaced, dt);
    }

    #[test]
    fn test_parse_date_only_is_midnight() {
        let dt = parse_timestamp("2024-01-15").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-15T00:00:00+00:00");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2024-13-45").is_none());
    }

    #[test]
    fn test_from_epoch_millis() {
        let dt = from_epoch_millis(1_704_067_200_000).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }
}
