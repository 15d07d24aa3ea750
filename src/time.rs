//! Totally ordered telemetry timestamps.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime};

use crate::error::ParseTimeError;

/// Layout used when printing times in alarm reports ("code A", UTC).
pub const CODE_A_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Milliseconds since the Unix epoch, UTC.
///
/// Comparison is plain integer ordering, so equal instants are equal and the
/// record time search can rely on inclusive boundaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderedTime(i64);

impl OrderedTime {
    pub const fn from_millis(millis: i64) -> Self {
        OrderedTime(millis)
    }

    pub const fn as_millis(self) -> i64 {
        self.0
    }
}

impl fmt::Display for OrderedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::from_timestamp_millis(self.0) {
            Some(dt) => write!(f, "{}", dt.format(CODE_A_FORMAT)),
            None => write!(f, "{}ms", self.0),
        }
    }
}

impl FromStr for OrderedTime {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(millis) = s.parse::<i64>() {
            return Ok(OrderedTime(millis));
        }

        let text = s.strip_suffix('Z').unwrap_or(s);
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .map(|naive| OrderedTime(naive.and_utc().timestamp_millis()))
            .ok_or_else(|| ParseTimeError(s.to_string()))
    }
}
