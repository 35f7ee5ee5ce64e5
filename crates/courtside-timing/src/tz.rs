use std::str::FromStr;

use chrono_tz::Tz;

use crate::error::{Result, TimingError};

/// Resolve an IANA timezone name to a usable zone handle.
pub fn resolve_timezone(name: &str) -> Result<Tz> {
    Tz::from_str(name).map_err(|_| TimingError::UnknownTimezone {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_zones_resolve() {
        assert!(resolve_timezone("Europe/Madrid").is_ok());
        assert!(resolve_timezone("UTC").is_ok());
        assert!(resolve_timezone("America/New_York").is_ok());
    }

    #[test]
    fn unknown_zone_is_an_error() {
        let err = resolve_timezone("Mars/Olympus").unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus"));
    }
}
