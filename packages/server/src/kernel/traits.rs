// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like availability or eligibility) should be domain
// functions that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseDispatchStore)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::common::geo::LatLng;
use crate::domains::equipment::models::VanEquipment;
use crate::domains::jobs::models::{Job, JobStatus, JobUpdate};
use crate::domains::routing::models::{TravelMode, TravelTimeCacheEntry};
use crate::domains::scheduling::models::{OptimizationPayload, OptimizerResponse};
use crate::domains::technicians::models::Technician;

// =============================================================================
// Dispatch Store Trait (Infrastructure - database reads + batched writes)
// =============================================================================

#[async_trait]
pub trait BaseDispatchStore: Send + Sync {
    /// Active technicians with van, home address, default hours and
    /// availability exceptions.
    async fn active_technicians(&self) -> Result<Vec<Technician>>;

    /// Jobs in the planner-relevant status set (or with no status),
    /// joined with address, service and order.
    async fn relevant_jobs(&self) -> Result<Vec<Job>>;

    async fn jobs_by_status(&self, statuses: &[JobStatus]) -> Result<Vec<Job>>;

    /// Van inventories, grouped by van id.
    async fn equipment_for_vans(
        &self,
        van_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<VanEquipment>>>;

    /// Equipment models a job requires (vehicle YMM × service, with
    /// generic-category fallback).
    async fn required_equipment_for_job(&self, job: &Job) -> Result<Vec<String>>;

    async fn ymm_id_for_order(&self, order_id: i64) -> Result<Option<i64>>;

    /// Write the run's final updates, grouped by identical payload.
    async fn update_jobs(&self, updates: &[JobUpdate]) -> Result<()>;
}

// =============================================================================
// Device Location Trait (Infrastructure - real-time van positions)
// =============================================================================

/// Latest known position of one tracked device.
#[derive(Debug, Clone)]
pub struct DeviceLocation {
    pub lat: f64,
    pub lng: f64,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait BaseLocationService: Send + Sync {
    /// Current positions keyed by device id. Callers treat failure as
    /// "no live positions" and carry on.
    async fn device_locations(&self) -> Result<HashMap<String, DeviceLocation>>;
}

// =============================================================================
// Distance Matrix Trait (Infrastructure - single pair lookups)
// =============================================================================

/// A resolved origin→destination leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelLeg {
    pub duration_seconds: i64,
    pub distance_meters: Option<i64>,
}

#[async_trait]
pub trait BaseDistanceMatrix: Send + Sync {
    /// Driving time for one pair; traffic-aware when a departure instant
    /// is given.
    async fn travel_time(
        &self,
        origin: LatLng,
        destination: LatLng,
        departure_time: Option<DateTime<Utc>>,
    ) -> Result<TravelLeg>;
}

// =============================================================================
// Travel Time Store Trait (Infrastructure - the persistent cache tier)
// =============================================================================

#[async_trait]
pub trait BaseTravelTimeStore: Send + Sync {
    /// Unexpired entries matching the mode and (for predictive) bucket,
    /// restricted by inclusive set filters on the given unique coordinate
    /// values. Callers post-filter on exact pair match.
    async fn fetch_live(
        &self,
        lats: &[f64],
        lngs: &[f64],
        mode: TravelMode,
        bucket: Option<(i16, i16)>,
        now: DateTime<Utc>,
    ) -> Result<Vec<TravelTimeCacheEntry>>;

    /// Idempotent upsert on the full cache key.
    async fn upsert(&self, entries: &[TravelTimeCacheEntry]) -> Result<()>;
}

// =============================================================================
// Route Optimizer Trait (Infrastructure - the external solver RPC)
// =============================================================================

#[async_trait]
pub trait BaseRouteOptimizer: Send + Sync {
    async fn solve(&self, payload: &OptimizationPayload) -> Result<OptimizerResponse>;
}
