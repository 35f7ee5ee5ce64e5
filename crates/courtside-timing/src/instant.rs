use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use crate::error::{Result, TimingError};

/// A wall-clock instant as entered or stored, before zone interpretation.
///
/// Naive values carry no offset and are interpreted in whatever zone the
/// consumer is bound to; offset-carrying values are converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalInstant {
    Naive(NaiveDateTime),
    Fixed(DateTime<FixedOffset>),
}

impl LocalInstant {
    /// Parse a stored timestamp: RFC 3339 first, then a bare local datetime
    /// (`2026-08-09T07:00:00` or `2026-08-09T07:00`).
    pub fn parse(s: &str) -> Result<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(LocalInstant::Fixed(dt));
        }
        for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(LocalInstant::Naive(naive));
            }
        }
        Err(TimingError::BadTimestamp(s.to_string()))
    }

    /// Interpret this instant in `tz`.
    ///
    /// Naive values are attached to the zone: ambiguous wall-clock times
    /// (autumn fold) take the earliest mapping, and times inside a
    /// spring-forward gap shift forward one hour.
    pub fn resolve(self, tz: Tz) -> DateTime<Tz> {
        match self {
            LocalInstant::Naive(naive) => match tz.from_local_datetime(&naive) {
                LocalResult::Single(dt) => dt,
                LocalResult::Ambiguous(earliest, _) => earliest,
                LocalResult::None => tz
                    .from_local_datetime(&(naive + Duration::hours(1)))
                    .earliest()
                    .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
            },
            LocalInstant::Fixed(dt) => dt.with_timezone(&tz),
        }
    }
}

impl From<NaiveDateTime> for LocalInstant {
    fn from(naive: NaiveDateTime) -> Self {
        LocalInstant::Naive(naive)
    }
}

impl From<DateTime<FixedOffset>> for LocalInstant {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        LocalInstant::Fixed(dt)
    }
}

impl From<DateTime<Tz>> for LocalInstant {
    fn from(dt: DateTime<Tz>) -> Self {
        LocalInstant::Fixed(dt.fixed_offset())
    }
}
