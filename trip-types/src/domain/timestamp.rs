//! Wall-clock timestamps as they appear on the wire: `YYYY-MM-DD HH:MM:SS`.
//!
//! Parsing is lenient so that data written by older clients still loads:
//! RFC 3339 strings keep their local wall time and bare dates mean midnight.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::DomainError;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local wall-clock time, truncated to whole seconds.
pub fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, DomainError> {
    let s = s.trim();
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
        return Ok(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(ts);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.naive_local());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    Err(DomainError::ValidationError(format!(
        "Invalid timestamp: {:?} (expected YYYY-MM-DD HH:MM:SS)",
        s
    )))
}

/// `#[serde(with = "...")]` helpers for required timestamps.
pub mod serde_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

/// `#[serde(with = "...")]` helpers for optional timestamps.
pub mod serde_timestamp_opt {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        ts: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => serializer.serialize_str(&super::format_timestamp(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => super::parse_timestamp(&raw)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wire_format() {
        let ts = parse_timestamp("2024-01-01 18:30:05").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-01 18:30:05");
    }

    #[test]
    fn test_parse_bare_date_is_midnight() {
        let ts = parse_timestamp("2024-01-02").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-02 00:00:00");
    }

    #[test]
    fn test_parse_rfc3339_keeps_wall_time() {
        let ts = parse_timestamp("2024-03-10T23:15:00+09:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-10 23:15:00");
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(DomainError::ValidationError(_))
        ));
    }

    #[test]
    fn test_now_has_whole_seconds() {
        let ts = now();
        assert_eq!(ts.nanosecond(), 0);
    }
}
