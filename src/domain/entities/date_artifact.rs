//! Date artifact entity
//!
//! Timestamps recovered from raw record files, with the decoders that
//! turn a raw integer into an instant.

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use std::fmt;

/// Millisecond epoch bounds (2000-01-01 .. 2050-01-01)
pub const JAVA_EPOCH_MIN: i64 = 946_684_800_000;
pub const JAVA_EPOCH_MAX: i64 = 2_524_608_000_000;
/// Second epoch bounds (same calendar window)
pub const UNIX_EPOCH_MIN: i64 = 946_684_800;
pub const UNIX_EPOCH_MAX: i64 = 2_524_608_000;

/// Encoding a raw timestamp value was recognized under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// Milliseconds since 1970-01-01
    JavaEpoch,
    /// Seconds since 1970-01-01
    UnixEpoch,
    /// Minutes since 1900-01-01. Decodable on request, never detected
    /// automatically.
    CalendarMinutes,
    Unknown,
}

impl DateFormat {
    pub fn tag(&self) -> &'static str {
        match self {
            DateFormat::JavaEpoch => "java_epoch",
            DateFormat::UnixEpoch => "unix_epoch",
            DateFormat::CalendarMinutes => "calendar_minutes",
            DateFormat::Unknown => "unknown",
        }
    }

    /// Decodes `raw` under this format. Range checks are the caller's job.
    pub fn decode(&self, raw: i64) -> Option<DateTime<Utc>> {
        match self {
            DateFormat::JavaEpoch => Utc.timestamp_millis_opt(raw).single(),
            DateFormat::UnixEpoch => Utc.timestamp_opt(raw, 0).single(),
            DateFormat::CalendarMinutes => decode_calendar_minutes(raw),
            DateFormat::Unknown => None,
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Minutes since 1900-01-01T00:00:00Z
pub fn decode_calendar_minutes(minutes: i64) -> Option<DateTime<Utc>> {
    let base = NaiveDate::from_ymd_opt(1900, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let delta = Duration::try_minutes(minutes)?;
    base.checked_add_signed(delta).map(|dt| dt.and_utc())
}

/// Renders an instant the way every artifact carries it
pub fn to_iso8601(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A timestamp found in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateArtifact {
    /// Where the value came from (relative path)
    pub source: String,
    /// Raw matched value: the digits, or hex of the 8 binary bytes
    pub raw_value: String,
    /// Decoded ISO-8601 instant
    pub decoded: String,
    pub format: DateFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_java_epoch() {
        let dt = DateFormat::JavaEpoch.decode(1_700_000_000_000).unwrap();
        assert_eq!(to_iso8601(&dt), "2023-11-14T22:13:20.000Z");
    }

    #[test]
    fn decodes_calendar_minutes() {
        let dt = decode_calendar_minutes(60 * 24).unwrap();
        assert_eq!(to_iso8601(&dt), "1900-01-02T00:00:00.000Z");
    }

    #[test]
    fn unknown_never_decodes() {
        assert!(DateFormat::Unknown.decode(0).is_none());
    }
}
