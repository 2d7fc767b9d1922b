//! Timestamp parsing and wire formatting
//!
//! Every instant leaves the API as RFC 3339 UTC with millisecond precision
//! and a `Z` suffix, e.g. `2025-03-10T00:00:00.000Z`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::Serializer;

/// Which textual forms a date field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateForm {
    /// RFC 3339, or an ISO datetime without offset (taken as UTC).
    DateTime,
    /// Same as `DateTime`, plus a bare `YYYY-MM-DD` meaning midnight UTC.
    DateOrDateTime,
}

/// Parse a client-supplied timestamp.
pub fn parse_instant(input: &str, form: DateForm) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, pattern) {
            return Some(naive.and_utc());
        }
    }

    if form == DateForm::DateOrDateTime {
        if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

/// Wire representation of an instant.
pub fn format_instant(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `#[serde(serialize_with = "...")]` helper for `DateTime<Utc>` fields.
pub fn serialize_instant<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_instant(dt))
}

/// `#[serde(serialize_with = "...")]` helper for `Option<DateTime<Utc>>` fields.
pub fn serialize_optional_instant<S: Serializer>(
    dt: &Option<DateTime<Utc>>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match dt {
        Some(dt) => s.serialize_str(&format_instant(dt)),
        None => s.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_date_is_midnight_utc() {
        let dt = parse_instant("2025-03-10", DateForm::DateOrDateTime).unwrap();
        assert_eq!(format_instant(&dt), "2025-03-10T00:00:00.000Z");
    }

    #[test]
    fn test_bare_date_rejected_for_datetime_form() {
        assert!(parse_instant("2025-03-10", DateForm::DateTime).is_none());
    }

    #[test]
    fn test_full_iso_passes_through() {
        let dt = parse_instant("2025-03-10T14:30:00.000Z", DateForm::DateOrDateTime).unwrap();
        assert_eq!(format_instant(&dt), "2025-03-10T14:30:00.000Z");
    }

    #[test]
    fn test_offset_converted_to_utc() {
        let dt = parse_instant("2025-03-10T14:30:00+02:00", DateForm::DateTime).unwrap();
        assert_eq!(format_instant(&dt), "2025-03-10T12:30:00.000Z");
    }

    #[test]
    fn test_naive_datetime_taken_as_utc() {
        let dt = parse_instant("2025-01-15T08:00:00", DateForm::DateTime).unwrap();
        assert_eq!(format_instant(&dt), "2025-01-15T08:00:00.000Z");
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(parse_instant("demain", DateForm::DateOrDateTime).is_none());
        assert!(parse_instant("2025-13-40", DateForm::DateOrDateTime).is_none());
        assert!(parse_instant("", DateForm::DateOrDateTime).is_none());
    }
}
