// SPDX-License-Identifier: MIT

//! Shared helpers for date/time formatting and the canonical day boundary.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time as an RFC3339 string with a `Z` suffix.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Canonical day key ("YYYY-MM-DD") at UTC midnight.
///
/// Used for recognition quota and performance metric document keys.
/// UTC applies uniformly; there is no local-time day boundary anywhere.
pub fn utc_day_key(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Today's canonical day key.
pub fn today_key() -> String {
    utc_day_key(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_key_is_utc_midnight_based() {
        let late = DateTime::parse_from_rfc3339("2024-03-01T23:59:59Z")
            .unwrap()
            .with_timezone(&Utc);
        let early = DateTime::parse_from_rfc3339("2024-03-02T00:00:01Z")
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(utc_day_key(late), "2024-03-01");
        assert_eq!(utc_day_key(early), "2024-03-02");
    }

    #[test]
    fn rfc3339_uses_z_suffix() {
        let dt = DateTime::parse_from_rfc3339("2024-03-01T10:30:00+00:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_utc_rfc3339(dt), "2024-03-01T10:30:00Z");
    }
}
