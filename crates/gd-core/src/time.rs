//! Timestamp parsing and calendar features.

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};

use crate::{GeoError, GeoResult};

pub const DAYS_PER_WEEK: usize = 7;
pub const QUARTER_HOURS_PER_DAY: usize = 96;
pub const MONTHS_PER_YEAR: usize = 12;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse RFC 3339 or a naive `YYYY-MM-DD[ T]HH:MM:SS[.f]` timestamp.  Naive
/// values are taken to be UTC.
pub fn parse_timestamp(s: &str) -> GeoResult<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| GeoError::Parse(format!("unrecognised timestamp {s:?}")))
}

/// Convert seconds since the Unix epoch.
pub fn from_unix_secs(secs: i64) -> GeoResult<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| GeoError::Parse(format!("unix time {secs} is out of range")))
}

/// Zero-based calendar features of a timestamp.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeFeatures {
    /// Monday = 0.
    pub day_of_week: u32,
    /// 15-minute slot of the day, `0..96`.
    pub quarter_hour_of_day: u32,
    /// January = 0.
    pub month: u32,
}

impl TimeFeatures {
    pub fn from_datetime(dt: &DateTime<Utc>) -> Self {
        Self {
            day_of_week:         dt.weekday().num_days_from_monday(),
            quarter_hour_of_day: dt.hour() * 4 + dt.minute() / 15,
            month:               dt.month0(),
        }
    }
}
