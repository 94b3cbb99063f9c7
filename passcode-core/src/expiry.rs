//! Parsing and presentation of passcode expiry times.

use chrono::{DateTime, FixedOffset, Utc};

/// Format for a time of day such as `4:00:00 PM`.
const TIME_OF_DAY_FORMAT: &str = "%-I:%M:%S %p";

/// Parses an ISO-8601 timestamp returned by the authority.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw.trim()).map(|dt| dt.with_timezone(&Utc))
}

/// Renders `at` as a wall-clock time of day in the given offset.
#[must_use]
pub fn render_time_of_day(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset)
        .format(TIME_OF_DAY_FORMAT)
        .to_string()
}

/// Picks the expiry text to show: a non-empty custom value wins over the authority's.
pub(crate) fn resolve_expiry(
    custom: &str,
    auto: Option<DateTime<Utc>>,
    offset: FixedOffset,
) -> Option<String> {
    if !custom.is_empty() {
        return Some(custom.to_string());
    }
    auto.map(|at| render_time_of_day(at, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Offset, TimeZone};

    fn four_pm() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 16, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_with_and_without_millis() {
        assert_eq!(parse_timestamp("2024-01-01T16:00:00Z").unwrap(), four_pm());
        assert_eq!(parse_timestamp("2024-01-01T16:00:00.000Z").unwrap(), four_pm());
        assert_eq!(parse_timestamp("2024-01-01T17:00:00+01:00").unwrap(), four_pm());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("tomorrow").is_err());
    }

    #[test]
    fn test_render_in_utc() {
        assert_eq!(render_time_of_day(four_pm(), Utc.fix()), "4:00:00 PM");
    }

    #[test]
    fn test_render_in_offset() {
        let lagos = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(render_time_of_day(four_pm(), lagos), "5:00:00 PM");
        let morning = Utc.with_ymd_and_hms(2024, 1, 1, 9, 5, 7).unwrap();
        assert_eq!(render_time_of_day(morning, Utc.fix()), "9:05:07 AM");
    }

    #[test]
    fn test_custom_wins_over_auto() {
        let resolved = resolve_expiry("5:00 PM", Some(four_pm()), Utc.fix());
        assert_eq!(resolved.as_deref(), Some("5:00 PM"));
    }

    #[test]
    fn test_falls_back_to_auto() {
        let resolved = resolve_expiry("", Some(four_pm()), Utc.fix());
        assert_eq!(resolved.as_deref(), Some("4:00:00 PM"));
        assert_eq!(resolve_expiry("", None, Utc.fix()), None);
    }
}
