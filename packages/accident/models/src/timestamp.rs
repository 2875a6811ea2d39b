//! Timestamps as reported by callers.
//!
//! A timestamp keeps the offset it arrived with, so hour-of-day and
//! day-of-week are read from the reporter's wall clock while ordering and
//! window comparisons still use the instant. A value without an offset
//! (`2024-01-15T14:30:00`) is taken as wall-clock time at UTC.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::de::Error as _;
use serde::{Deserialize as _, Deserializer};

const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses an RFC 3339 timestamp, a timestamp without an offset, or a bare
/// date (midnight).
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|dt| dt.and_utc().fixed_offset())
}

/// Serde `deserialize_with` helper accepting every format
/// [`parse_timestamp`] does.
///
/// # Errors
///
/// Fails if the value is not a string or does not parse.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_timestamp(&value).ok_or_else(|| D::Error::custom(format!("invalid timestamp '{value}'")))
}

/// Like [`deserialize`], for optional fields. Pair with `#[serde(default)]`.
///
/// # Errors
///
/// Fails if a present value is not a string or does not parse.
pub fn deserialize_option<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<FixedOffset>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|value| {
            parse_timestamp(&value)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp '{value}'")))
        })
        .transpose()
}
