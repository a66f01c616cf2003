//! Two-tier travel-time cache in front of the distance-matrix provider.
//!
//! Real-time entries serve today's planning and expire in minutes;
//! predictive entries are bucketed by UTC hour-of-week and serve future
//! days. Coordinates are rounded to 6 decimals before they are used as
//! keys anywhere, so identical points always hit the same entry.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::common::geo::{CoordKey, LatLng};
use crate::domains::routing::models::{TravelMode, TravelTimeCacheEntry, PENALTY_TRAVEL_SECONDS};
use crate::kernel::traits::{BaseDistanceMatrix, BaseTravelTimeStore};

/// Concurrent provider calls per bulk fill.
const PROVIDER_CONCURRENCY: usize = 10;

pub struct TravelTimeCache {
    store: Arc<dyn BaseTravelTimeStore>,
    provider: Arc<dyn BaseDistanceMatrix>,
}

impl TravelTimeCache {
    pub fn new(store: Arc<dyn BaseTravelTimeStore>, provider: Arc<dyn BaseDistanceMatrix>) -> Self {
        Self { store, provider }
    }

    /// Travel time for a single pair, in seconds.
    pub async fn lookup(
        &self,
        origin: LatLng,
        destination: LatLng,
        mode: TravelMode,
        departure_time: Option<DateTime<Utc>>,
    ) -> i64 {
        let times = self
            .bulk_travel_times(&[(origin, destination)], mode, departure_time)
            .await;
        let key = (origin.rounded().key(), destination.rounded().key());
        times.get(&key).copied().unwrap_or(PENALTY_TRAVEL_SECONDS)
    }

    /// Resolve every pair for a run: one cache read, concurrent provider
    /// calls for the misses, one upsert of the fresh results.
    ///
    /// Self-pairs are 0 and never persisted. Pairs the provider cannot
    /// resolve get the penalty value so the optimizer routes around them;
    /// penalties are not persisted either.
    pub async fn bulk_travel_times(
        &self,
        pairs: &[(LatLng, LatLng)],
        mode: TravelMode,
        departure_time: Option<DateTime<Utc>>,
    ) -> HashMap<(CoordKey, CoordKey), i64> {
        let now = Utc::now();
        let bucket = mode.bucket(departure_time);

        let mut times: HashMap<(CoordKey, CoordKey), i64> = HashMap::new();
        let mut wanted: Vec<(LatLng, LatLng)> = Vec::new();
        let mut wanted_keys: HashSet<(CoordKey, CoordKey)> = HashSet::new();

        for (origin, destination) in pairs {
            let o = origin.rounded();
            let d = destination.rounded();
            let key = (o.key(), d.key());
            if key.0 == key.1 {
                times.insert(key, 0);
                continue;
            }
            if wanted_keys.insert(key) {
                wanted.push((o, d));
            }
        }

        if wanted.is_empty() {
            return times;
        }

        // Inclusive set filter over every distinct coordinate value; exact
        // pair membership is re-checked here.
        let mut lat_keys: HashSet<i64> = HashSet::new();
        let mut lng_keys: HashSet<i64> = HashSet::new();
        let mut lats: Vec<f64> = Vec::new();
        let mut lngs: Vec<f64> = Vec::new();
        for (o, d) in &wanted {
            for point in [o, d] {
                let (lat_key, lng_key) = point.key();
                if lat_keys.insert(lat_key) {
                    lats.push(point.lat);
                }
                if lng_keys.insert(lng_key) {
                    lngs.push(point.lng);
                }
            }
        }

        match self.store.fetch_live(&lats, &lngs, mode, bucket, now).await {
            Ok(entries) => {
                for entry in entries {
                    let key = (
                        LatLng::new(entry.origin_lat, entry.origin_lng).key(),
                        LatLng::new(entry.destination_lat, entry.destination_lng).key(),
                    );
                    if wanted_keys.contains(&key) {
                        times.insert(key, entry.travel_time_seconds);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Travel-time cache read failed; treating all pairs as misses");
            }
        }

        let misses: Vec<(LatLng, LatLng)> = wanted
            .iter()
            .filter(|(o, d)| !times.contains_key(&(o.key(), d.key())))
            .copied()
            .collect();

        if misses.is_empty() {
            return times;
        }

        tracing::debug!(
            pairs = wanted.len(),
            misses = misses.len(),
            mode = ?mode,
            "Filling travel-time cache misses from provider"
        );

        let results: Vec<((LatLng, LatLng), anyhow::Result<crate::kernel::traits::TravelLeg>)> =
            stream::iter(misses)
                .map(move |(o, d)| async move {
                    let leg = self.provider.travel_time(o, d, departure_time).await;
                    ((o, d), leg)
                })
                .buffer_unordered(PROVIDER_CONCURRENCY)
                .collect()
                .await;

        let mut fresh: Vec<TravelTimeCacheEntry> = Vec::new();
        for ((o, d), result) in results {
            let key = (o.key(), d.key());
            match result {
                Ok(leg) => {
                    times.insert(key, leg.duration_seconds);
                    fresh.push(TravelTimeCacheEntry {
                        origin_lat: o.lat,
                        origin_lng: o.lng,
                        destination_lat: d.lat,
                        destination_lng: d.lng,
                        is_predictive: mode.is_predictive(),
                        target_hour_utc: bucket.map(|b| b.0),
                        target_day_of_week_utc: bucket.map(|b| b.1),
                        travel_time_seconds: leg.duration_seconds,
                        distance_meters: leg.distance_meters,
                        expires_at: now + mode.ttl(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        origin = ?(o.lat, o.lng),
                        destination = ?(d.lat, d.lng),
                        error = %e,
                        "Distance matrix lookup failed; using penalty travel time"
                    );
                    times.insert(key, PENALTY_TRAVEL_SECONDS);
                }
            }
        }

        if !fresh.is_empty() {
            if let Err(e) = self.store.upsert(&fresh).await {
                tracing::warn!(entries = fresh.len(), error = %e, "Travel-time cache upsert failed");
            }
        }

        times
    }
}
