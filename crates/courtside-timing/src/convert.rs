use chrono::{DateTime, Timelike};
use chrono_tz::Tz;

use crate::instant::LocalInstant;

/// Converts local wall-clock instants into the booking platform's target
/// zone and derives slot codes from them.
#[derive(Debug, Clone, Copy)]
pub struct ZoneConverter {
    local: Tz,
    target: Tz,
}

impl ZoneConverter {
    pub fn new(local: Tz, target: Tz) -> Self {
        Self { local, target }
    }

    /// Interpret `instant` in the local zone and convert it to the target
    /// zone. Pure: the same input always maps to the same output.
    pub fn to_target(&self, instant: impl Into<LocalInstant>) -> DateTime<Tz> {
        instant.into().resolve(self.local).with_timezone(&self.target)
    }

    /// Derive the slot code for a play instant: the target-zone hour as
    /// `T{HH}%3A00~60` (colon URL-escaped, `~60` is the slot length).
    pub fn booking_code(&self, instant: impl Into<LocalInstant>) -> String {
        let target = self.to_target(instant);
        format!("T{:02}%3A00~60", target.hour())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use chrono_tz::Europe::Madrid;
    use chrono_tz::UTC;

    fn converter() -> ZoneConverter {
        ZoneConverter::new(Madrid, UTC)
    }

    fn play(y: i32, mo: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn morning_slot() {
        // Madrid 08:00 in January (CET, +01:00) is 07:00 UTC.
        assert_eq!(converter().booking_code(play(2026, 1, 15, 8)), "T07%3A00~60");
    }

    #[test]
    fn late_slot_crosses_midnight() {
        // Madrid 00:00 is 23:00 UTC the previous day.
        assert_eq!(converter().booking_code(play(2026, 1, 15, 0)), "T23%3A00~60");
    }

    #[test]
    fn midnight_in_target_zone() {
        // Madrid 01:00 is 00:00 UTC.
        assert_eq!(converter().booking_code(play(2026, 1, 15, 1)), "T00%3A00~60");
    }

    #[test]
    fn derivation_is_idempotent() {
        let c = converter();
        let instant = play(2026, 6, 1, 18);
        assert_eq!(c.booking_code(instant), c.booking_code(instant));
    }

    #[test]
    fn offset_aware_input_matches_naive() {
        let c = converter();
        // 08:00+01:00 is the same instant as naive Madrid 08:00 in January.
        let aware = chrono::DateTime::parse_from_rfc3339("2026-01-15T08:00:00+01:00").unwrap();
        assert_eq!(c.booking_code(aware), c.booking_code(play(2026, 1, 15, 8)));
    }
}
