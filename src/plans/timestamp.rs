//! Serde helpers for backend timestamps
//!
//! The backend emits naive ISO-8601 timestamps (no offset) which are UTC.
//! Offset timestamps are converted to UTC and bare dates become UTC
//! midnight, so everything downstream compares instants in one reference.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serializer};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse a backend timestamp into a UTC instant
pub fn parse_utc(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Format a UTC instant as RFC 3339 with a `Z` suffix
pub fn format_utc(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_utc(value))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_utc(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
}

pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => super::serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse_utc(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn naive_is_utc() {
        assert_eq!(
            parse_utc("2024-03-01T23:30:00"),
            Some(utc("2024-03-01T23:30:00Z"))
        );
        assert_eq!(
            parse_utc("2024-03-01 23:30:00.5"),
            Some(utc("2024-03-01T23:30:00.5Z"))
        );
        assert_eq!(parse_utc("2024-03-01T23:30"), Some(utc("2024-03-01T23:30:00Z")));
    }

    #[test]
    fn offsets_are_converted() {
        assert_eq!(
            parse_utc("2024-03-02T01:30:00+02:00"),
            Some(utc("2024-03-01T23:30:00Z"))
        );
    }

    #[test]
    fn bare_date_is_utc_midnight() {
        assert_eq!(parse_utc("2024-05-10"), Some(utc("2024-05-10T00:00:00Z")));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_utc("next tuesday"), None);
    }

    #[test]
    fn formats_with_z() {
        assert_eq!(format_utc(&utc("2024-05-10T08:00:00+00:00")), "2024-05-10T08:00:00Z");
    }
}
