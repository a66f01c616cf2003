use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domains::routing::models::{TravelMode, TravelTimeCacheEntry};
use crate::kernel::traits::BaseTravelTimeStore;

/// Postgres-backed travel-time cache store.
pub struct PgTravelTimeStore {
    pool: PgPool,
}

impl PgTravelTimeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseTravelTimeStore for PgTravelTimeStore {
    /// One query per bulk read. Filtering by inclusive coordinate-value
    /// sets keeps the filter size linear in distinct coordinates rather
    /// than quadratic in pairs; the cache layer post-filters exact pairs.
    async fn fetch_live(
        &self,
        lats: &[f64],
        lngs: &[f64],
        mode: TravelMode,
        bucket: Option<(i16, i16)>,
        now: DateTime<Utc>,
    ) -> Result<Vec<TravelTimeCacheEntry>> {
        let rows = sqlx::query_as::<_, TravelTimeCacheEntry>(
            r#"
            SELECT
                origin_lat, origin_lng, destination_lat, destination_lng,
                is_predictive, target_hour_utc, target_day_of_week_utc,
                travel_time_seconds, distance_meters, expires_at
            FROM travel_time_cache
            WHERE origin_lat = ANY($1)
              AND origin_lng = ANY($2)
              AND destination_lat = ANY($1)
              AND destination_lng = ANY($2)
              AND is_predictive = $3
              AND target_hour_utc IS NOT DISTINCT FROM $4
              AND target_day_of_week_utc IS NOT DISTINCT FROM $5
              AND expires_at > $6
            "#,
        )
        .bind(lats)
        .bind(lngs)
        .bind(mode.is_predictive())
        .bind(bucket.map(|b| b.0))
        .bind(bucket.map(|b| b.1))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn upsert(&self, entries: &[TravelTimeCacheEntry]) -> Result<()> {
        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO travel_time_cache (
                    origin_lat, origin_lng, destination_lat, destination_lng,
                    is_predictive, target_hour_utc, target_day_of_week_utc,
                    travel_time_seconds, distance_meters, expires_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ON CONFLICT (
                    origin_lat, origin_lng, destination_lat, destination_lng,
                    is_predictive,
                    COALESCE(target_hour_utc, -1),
                    COALESCE(target_day_of_week_utc, -1)
                )
                DO UPDATE SET
                    travel_time_seconds = EXCLUDED.travel_time_seconds,
                    distance_meters = EXCLUDED.distance_meters,
                    expires_at = EXCLUDED.expires_at
                "#,
            )
            .bind(entry.origin_lat)
            .bind(entry.origin_lng)
            .bind(entry.destination_lat)
            .bind(entry.destination_lng)
            .bind(entry.is_predictive)
            .bind(entry.target_hour_utc)
            .bind(entry.target_day_of_week_utc)
            .bind(entry.travel_time_seconds)
            .bind(entry.distance_meters)
            .bind(entry.expires_at)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }
}
