//! Timestamp formatting for the wire protocol.
//!
//! The protocol renders every timestamp as UTC in `2006-01-02T15:04:05Z`
//! form, with no sub-second precision and no numeric offset.

use chrono::{DateTime, NaiveDateTime, Utc};

/// `strftime` description of the wire timestamp format.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Render a timestamp in wire format, normalising to UTC.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a wire-format timestamp.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map(|naive| naive.and_utc())
}

/// Serde adapter serialising timestamps in wire format.
///
/// Used via `#[serde(with = "waymark_core::time::ts_format")]` on model
/// fields so the JSON output matches the XML attribute format.
pub mod ts_format {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialise a timestamp in wire format.
    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(timestamp))
    }

    /// Deserialise a wire-format timestamp.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone, Utc};
    use rstest::rstest;

    #[rstest]
    fn formats_utc_timestamps() {
        let ts = Utc.with_ymd_and_hms(2012, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "2012-01-01T00:00:00Z");
    }

    #[rstest]
    fn normalises_offsets_to_utc() {
        let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
        let ts = new_york
            .with_ymd_and_hms(2012, 1, 1, 0, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_timestamp(&ts), "2012-01-01T05:00:00Z");
    }

    #[rstest]
    fn round_trips_through_parse() {
        let ts = Utc.with_ymd_and_hms(2020, 6, 15, 12, 30, 45).unwrap();
        let parsed = parse_timestamp(&format_timestamp(&ts)).expect("parse");
        assert_eq!(parsed, ts);
    }

    #[rstest]
    #[case("2012-01-01")]
    #[case("2012-01-01T00:00:00+01:00")]
    #[case("not a timestamp")]
    fn rejects_other_formats(#[case] raw: &str) {
        assert!(parse_timestamp(raw).is_err());
    }
}
