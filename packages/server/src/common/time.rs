//! Business-timezone ↔ UTC conversions.
//!
//! Technician working hours are stored as wall-clock strings ("09:00:00")
//! in the business timezone. All planning arithmetic happens on UTC
//! instants; these helpers are the only place the two meet. Date keys are
//! always derived from UTC components.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

/// Interpret a "HH:MM:SS" wall-clock string in `tz` on the given calendar
/// date, producing a UTC instant.
///
/// On a spring-forward day the skipped hour has no mapping; such times are
/// an error and the caller drops the window.
pub fn parse_business_time(date: NaiveDate, time: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let t = NaiveTime::parse_from_str(time, "%H:%M:%S")
        .with_context(|| format!("invalid time-of-day string: {:?}", time))?;
    let local = date.and_time(t);
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("{} does not exist in {} on {}", time, tz, date))
}

/// Format an instant as a business-timezone date/time string.
/// Inverse of [`parse_business_time`] modulo the second.
pub fn format_business(instant: DateTime<Utc>, tz: Tz) -> String {
    instant
        .with_timezone(&tz)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// UTC offset in effect in `tz` at the target instant. DST transitions are
/// resolved by the instant itself, not by the date the caller started from.
pub fn utc_offset_at(instant: DateTime<Utc>, tz: Tz) -> FixedOffset {
    tz.offset_from_utc_datetime(&instant.naive_utc()).fix()
}

/// Canonical "YYYY-MM-DD" label for an instant, from UTC components.
pub fn date_key(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d").to_string()
}

/// UTC calendar date of an instant.
pub fn utc_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// Nominal departure instant used for predictive travel-time lookups on a
/// future planning day.
pub fn predictive_departure(target_date: NaiveDate, hour_utc: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(
        &target_date
            .and_hms_opt(hour_utc, 0, 0)
            .unwrap_or_else(|| target_date.and_hms_opt(12, 0, 0).expect("noon is valid")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Edmonton;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_mst_and_mdt() {
        // January: MST, UTC-7
        let winter = parse_business_time(date(2024, 1, 15), "09:00:00", Edmonton).unwrap();
        assert_eq!(winter.to_rfc3339(), "2024-01-15T16:00:00+00:00");

        // July: MDT, UTC-6
        let summer = parse_business_time(date(2024, 7, 15), "09:00:00", Edmonton).unwrap();
        assert_eq!(summer.to_rfc3339(), "2024-07-15T15:00:00+00:00");
    }

    #[test]
    fn offset_flips_at_spring_forward() {
        // 2024-03-10 02:00 local is the second Sunday of March
        let before = Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 3, 10, 10, 0, 0).unwrap();
        assert_eq!(utc_offset_at(before, Edmonton).local_minus_utc(), -7 * 3600);
        assert_eq!(utc_offset_at(after, Edmonton).local_minus_utc(), -6 * 3600);
    }

    #[test]
    fn offset_flips_at_fall_back() {
        // 2024-11-03 02:00 local is the first Sunday of November
        let before = Utc.with_ymd_and_hms(2024, 11, 3, 7, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 11, 3, 10, 0, 0).unwrap();
        assert_eq!(utc_offset_at(before, Edmonton).local_minus_utc(), -6 * 3600);
        assert_eq!(utc_offset_at(after, Edmonton).local_minus_utc(), -7 * 3600);
    }

    #[test]
    fn skipped_hour_is_an_error() {
        // 02:30 local does not exist on 2024-03-10 in Edmonton
        assert!(parse_business_time(date(2024, 3, 10), "02:30:00", Edmonton).is_err());
    }

    #[test]
    fn format_round_trips() {
        let instant = parse_business_time(date(2024, 7, 15), "14:45:00", Edmonton).unwrap();
        assert_eq!(format_business(instant, Edmonton), "2024-07-15 14:45:00");
    }

    #[test]
    fn date_key_uses_utc_components() {
        // 23:30 local in Edmonton is already the next day in UTC
        let late = parse_business_time(date(2024, 7, 15), "23:30:00", Edmonton).unwrap();
        assert_eq!(date_key(late), "2024-07-16");
    }

    #[test]
    fn rejects_malformed_time() {
        assert!(parse_business_time(date(2024, 1, 1), "9am", Edmonton).is_err());
        assert!(parse_business_time(date(2024, 1, 1), "", Edmonton).is_err());
    }
}
