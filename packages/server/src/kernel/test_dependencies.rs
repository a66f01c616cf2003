// Mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::common::geo::LatLng;
use crate::domains::equipment::models::VanEquipment;
use crate::domains::jobs::models::{Job, JobStatus, JobUpdate};
use crate::domains::routing::models::{TravelMode, TravelTimeCacheEntry};
use crate::domains::scheduling::models::{OptimizationPayload, OptimizerResponse};
use crate::domains::technicians::models::Technician;

use super::traits::{
    BaseDispatchStore, BaseDistanceMatrix, BaseLocationService, BaseTravelTimeStore,
    DeviceLocation, TravelLeg,
};

// =============================================================================
// Mock Dispatch Store
// =============================================================================

/// In-memory store seeded by tests; records every update batch written.
#[derive(Default)]
pub struct MockDispatchStore {
    technicians: Mutex<Vec<Technician>>,
    jobs: Mutex<Vec<Job>>,
    van_equipment: Mutex<HashMap<i64, Vec<VanEquipment>>>,
    required_equipment: Mutex<HashMap<i64, Vec<String>>>,
    ymm_ids: Mutex<HashMap<i64, i64>>,
    written_updates: Mutex<Vec<Vec<JobUpdate>>>,
    fail_writes: Mutex<bool>,
}

impl MockDispatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_technicians(self, technicians: Vec<Technician>) -> Self {
        *self.technicians.lock().unwrap() = technicians;
        self
    }

    pub fn with_jobs(self, jobs: Vec<Job>) -> Self {
        *self.jobs.lock().unwrap() = jobs;
        self
    }

    /// Seed one van's inventory by model names.
    pub fn with_van_models(self, van_id: i64, models: &[&str]) -> Self {
        let items = models
            .iter()
            .enumerate()
            .map(|(i, m)| VanEquipment {
                van_id,
                equipment_id: van_id * 100 + i as i64,
                model: m.to_string(),
            })
            .collect();
        self.van_equipment.lock().unwrap().insert(van_id, items);
        self
    }

    /// Seed the equipment models required by one job.
    pub fn with_required_equipment(self, job_id: i64, models: &[&str]) -> Self {
        self.required_equipment
            .lock()
            .unwrap()
            .insert(job_id, models.iter().map(|m| m.to_string()).collect());
        self
    }

    pub fn with_ymm_id(self, order_id: i64, ymm_id: i64) -> Self {
        self.ymm_ids.lock().unwrap().insert(order_id, ymm_id);
        self
    }

    pub fn failing_writes(self) -> Self {
        *self.fail_writes.lock().unwrap() = true;
        self
    }

    /// All updates written, flattened across batches.
    pub fn written_updates(&self) -> Vec<JobUpdate> {
        self.written_updates
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    /// Number of update_jobs calls (one per run).
    pub fn write_calls(&self) -> usize {
        self.written_updates.lock().unwrap().len()
    }

    pub fn update_for(&self, job_id: i64) -> Option<JobUpdate> {
        self.written_updates()
            .into_iter()
            .find(|u| u.job_id == job_id)
    }
}

#[async_trait]
impl BaseDispatchStore for MockDispatchStore {
    async fn active_technicians(&self) -> Result<Vec<Technician>> {
        Ok(self.technicians.lock().unwrap().clone())
    }

    async fn relevant_jobs(&self) -> Result<Vec<Job>> {
        let relevant = [
            JobStatus::Queued,
            JobStatus::EnRoute,
            JobStatus::InProgress,
            JobStatus::FixedTime,
        ];
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| relevant.contains(&j.status))
            .cloned()
            .collect())
    }

    async fn jobs_by_status(&self, statuses: &[JobStatus]) -> Result<Vec<Job>> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| statuses.contains(&j.status))
            .cloned()
            .collect())
    }

    async fn equipment_for_vans(
        &self,
        van_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<VanEquipment>>> {
        let all = self.van_equipment.lock().unwrap();
        Ok(van_ids
            .iter()
            .filter_map(|id| all.get(id).map(|items| (*id, items.clone())))
            .collect())
    }

    async fn required_equipment_for_job(&self, job: &Job) -> Result<Vec<String>> {
        Ok(self
            .required_equipment
            .lock()
            .unwrap()
            .get(&job.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn ymm_id_for_order(&self, order_id: i64) -> Result<Option<i64>> {
        Ok(self.ymm_ids.lock().unwrap().get(&order_id).copied())
    }

    async fn update_jobs(&self, updates: &[JobUpdate]) -> Result<()> {
        if *self.fail_writes.lock().unwrap() {
            anyhow::bail!("mock write failure");
        }
        self.written_updates.lock().unwrap().push(updates.to_vec());
        Ok(())
    }
}

// =============================================================================
// Mock Location Service
// =============================================================================

pub struct MockLocationService {
    locations: Mutex<HashMap<String, DeviceLocation>>,
    fail: bool,
}

impl MockLocationService {
    pub fn new() -> Self {
        Self {
            locations: Mutex::new(HashMap::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            locations: Mutex::new(HashMap::new()),
            fail: true,
        }
    }

    pub fn with_device(self, device_id: &str, lat: f64, lng: f64) -> Self {
        self.locations.lock().unwrap().insert(
            device_id.to_string(),
            DeviceLocation {
                lat,
                lng,
                timestamp: Utc::now(),
            },
        );
        self
    }
}

impl Default for MockLocationService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseLocationService for MockLocationService {
    async fn device_locations(&self) -> Result<HashMap<String, DeviceLocation>> {
        if self.fail {
            anyhow::bail!("mock location fetch failure");
        }
        Ok(self.locations.lock().unwrap().clone())
    }
}

// =============================================================================
// Mock Route Optimizer
// =============================================================================

/// Scripted optimizer: returns queued responses in order, records every
/// payload it was sent. When the queue drains it repeats the last
/// response, or fails if it never had one.
pub struct MockRouteOptimizer {
    responses: Mutex<VecDeque<OptimizerResponse>>,
    last: Mutex<Option<OptimizerResponse>>,
    calls: Mutex<Vec<OptimizationPayload>>,
    fail: Mutex<bool>,
}

impl MockRouteOptimizer {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            fail: Mutex::new(false),
        }
    }

    pub fn with_response(self, response: OptimizerResponse) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// Make every solve call fail at the transport level.
    pub fn failing() -> Self {
        let optimizer = Self::new();
        *optimizer.fail.lock().unwrap() = true;
        optimizer
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn sent_payloads(&self) -> Vec<OptimizationPayload> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_payload(&self) -> Option<OptimizationPayload> {
        self.calls.lock().unwrap().last().cloned()
    }
}

impl Default for MockRouteOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl crate::kernel::traits::BaseRouteOptimizer for MockRouteOptimizer {
    async fn solve(&self, payload: &OptimizationPayload) -> Result<OptimizerResponse> {
        self.calls.lock().unwrap().push(payload.clone());
        if *self.fail.lock().unwrap() {
            anyhow::bail!("mock optimizer transport failure");
        }
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(response) => {
                *self.last.lock().unwrap() = Some(response.clone());
                Ok(response)
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| anyhow::anyhow!("mock optimizer has no scripted response")),
        }
    }
}

// =============================================================================
// Mock Distance Matrix
// =============================================================================

pub struct MockDistanceMatrix {
    seconds: i64,
    fail: bool,
    calls: Mutex<usize>,
}

impl MockDistanceMatrix {
    /// Every pair resolves to the same duration.
    pub fn constant(seconds: i64) -> Self {
        Self {
            seconds,
            fail: false,
            calls: Mutex::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            seconds: 0,
            fail: true,
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl BaseDistanceMatrix for MockDistanceMatrix {
    async fn travel_time(
        &self,
        _origin: LatLng,
        _destination: LatLng,
        _departure_time: Option<DateTime<Utc>>,
    ) -> Result<TravelLeg> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            anyhow::bail!("mock distance matrix failure");
        }
        Ok(TravelLeg {
            duration_seconds: self.seconds,
            distance_meters: Some(self.seconds * 12),
        })
    }
}

// =============================================================================
// Mock Travel Time Store
// =============================================================================

/// In-memory cache store honouring the mode/bucket/expiry filters.
#[derive(Default)]
pub struct MockTravelTimeStore {
    entries: Mutex<Vec<TravelTimeCacheEntry>>,
}

impl MockTravelTimeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored_entries(&self) -> Vec<TravelTimeCacheEntry> {
        self.entries.lock().unwrap().clone()
    }
}

fn entry_key(e: &TravelTimeCacheEntry) -> (LatLng, LatLng, bool, Option<i16>, Option<i16>) {
    (
        LatLng::new(e.origin_lat, e.origin_lng),
        LatLng::new(e.destination_lat, e.destination_lng),
        e.is_predictive,
        e.target_hour_utc,
        e.target_day_of_week_utc,
    )
}

#[async_trait]
impl BaseTravelTimeStore for MockTravelTimeStore {
    async fn fetch_live(
        &self,
        lats: &[f64],
        lngs: &[f64],
        mode: TravelMode,
        bucket: Option<(i16, i16)>,
        now: DateTime<Utc>,
    ) -> Result<Vec<TravelTimeCacheEntry>> {
        let contains = |values: &[f64], v: f64| values.iter().any(|x| *x == v);
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| {
                e.is_predictive == mode.is_predictive()
                    && e.target_hour_utc == bucket.map(|b| b.0)
                    && e.target_day_of_week_utc == bucket.map(|b| b.1)
                    && e.expires_at > now
                    && contains(lats, e.origin_lat)
                    && contains(lats, e.destination_lat)
                    && contains(lngs, e.origin_lng)
                    && contains(lngs, e.destination_lng)
            })
            .cloned()
            .collect())
    }

    async fn upsert(&self, fresh: &[TravelTimeCacheEntry]) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        for entry in fresh {
            let key = {
                let k = entry_key(entry);
                (k.0.key(), k.1.key(), k.2, k.3, k.4)
            };
            entries.retain(|e| {
                let existing = entry_key(e);
                (existing.0.key(), existing.1.key(), existing.2, existing.3, existing.4) != key
            });
            entries.push(entry.clone());
        }
        Ok(())
    }
}
