use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Travel time reported for pairs the provider could not resolve. High
/// enough that the optimizer routes around them.
pub const PENALTY_TRAVEL_SECONDS: i64 = 999_999;

/// Cache tier. Real-time entries are used when planning today; predictive
/// entries, bucketed by hour-of-week, for future days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    RealTime,
    Predictive,
}

impl TravelMode {
    pub fn is_predictive(&self) -> bool {
        matches!(self, TravelMode::Predictive)
    }

    /// Entry lifetime: live traffic goes stale in minutes, the
    /// hour-of-week profile holds for a day.
    pub fn ttl(&self) -> Duration {
        match self {
            TravelMode::RealTime => Duration::minutes(20),
            TravelMode::Predictive => Duration::hours(24),
        }
    }

    /// The (hour-of-day, day-of-week) UTC bucket for a predictive
    /// departure instant. Real-time lookups are unbucketed.
    pub fn bucket(&self, departure: Option<DateTime<Utc>>) -> Option<(i16, i16)> {
        match self {
            TravelMode::RealTime => None,
            TravelMode::Predictive => departure.map(|at| {
                (
                    at.hour() as i16,
                    at.weekday().num_days_from_sunday() as i16,
                )
            }),
        }
    }
}

/// One row of the `travel_time_cache` table. Coordinates are stored
/// rounded to 6 decimals; together with the mode and predictive bucket
/// they form the unique key that makes upserts idempotent.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TravelTimeCacheEntry {
    pub origin_lat: f64,
    pub origin_lng: f64,
    pub destination_lat: f64,
    pub destination_lng: f64,
    pub is_predictive: bool,
    pub target_hour_utc: Option<i16>,
    pub target_day_of_week_utc: Option<i16>,
    pub travel_time_seconds: i64,
    pub distance_meters: Option<i64>,
    pub expires_at: DateTime<Utc>,
}
