//! Server dependencies for the replan core (using traits for testability)
//!
//! This module provides the central dependency container handed to the
//! orchestrator and its activities. All external services sit behind
//! trait abstractions to enable testing.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

use google_maps::DistanceMatrixClient;
use onestep_gps::OneStepGpsClient;

use crate::common::geo::LatLng;
use crate::config::ReplanSettings;
use crate::domains::equipment::data::{required_models_for_job, ymm_id_for_order};
use crate::domains::equipment::models::VanEquipment;
use crate::domains::jobs::models::{Job, JobStatus, JobUpdate};
use crate::domains::routing::TravelTimeCache;
use crate::domains::technicians::models::Technician;
use crate::kernel::traits::{
    BaseDispatchStore, BaseDistanceMatrix, BaseLocationService, DeviceLocation, TravelLeg,
};

// =============================================================================
// Postgres dispatch store (implements BaseDispatchStore trait)
// =============================================================================

/// Database-backed store, delegating to the domain data modules.
pub struct PgDispatchStore {
    pool: PgPool,
}

impl PgDispatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseDispatchStore for PgDispatchStore {
    async fn active_technicians(&self) -> Result<Vec<Technician>> {
        Technician::find_active(&self.pool).await
    }

    async fn relevant_jobs(&self) -> Result<Vec<Job>> {
        Job::find_relevant(&self.pool).await
    }

    async fn jobs_by_status(&self, statuses: &[JobStatus]) -> Result<Vec<Job>> {
        Job::find_by_statuses(&self.pool, statuses).await
    }

    async fn equipment_for_vans(
        &self,
        van_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<VanEquipment>>> {
        VanEquipment::find_for_vans(&self.pool, van_ids).await
    }

    async fn required_equipment_for_job(&self, job: &Job) -> Result<Vec<String>> {
        required_models_for_job(&self.pool, job).await
    }

    async fn ymm_id_for_order(&self, order_id: i64) -> Result<Option<i64>> {
        ymm_id_for_order(&self.pool, order_id).await
    }

    async fn update_jobs(&self, updates: &[JobUpdate]) -> Result<()> {
        Job::apply_updates(&self.pool, updates).await
    }
}

// =============================================================================
// External client adapters
// =============================================================================

/// Wrapper around the OneStepGPS client implementing BaseLocationService.
pub struct OneStepGpsAdapter(pub Arc<OneStepGpsClient>);

#[async_trait]
impl BaseLocationService for OneStepGpsAdapter {
    async fn device_locations(&self) -> Result<HashMap<String, DeviceLocation>> {
        let devices = self
            .0
            .latest_device_points()
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        Ok(devices
            .into_iter()
            .filter_map(|d| {
                d.latest_device_point.map(|p| {
                    (
                        d.device_id,
                        DeviceLocation {
                            lat: p.lat,
                            lng: p.lng,
                            timestamp: p.dt_tracker,
                        },
                    )
                })
            })
            .collect())
    }
}

/// No-op location service for environments without a tracker API key.
pub struct NoopLocationService;

#[async_trait]
impl BaseLocationService for NoopLocationService {
    async fn device_locations(&self) -> Result<HashMap<String, DeviceLocation>> {
        tracing::warn!("NoopLocationService: no OneStepGPS API key configured");
        Ok(HashMap::new())
    }
}

/// Wrapper around the Distance Matrix client implementing
/// BaseDistanceMatrix.
pub struct DistanceMatrixAdapter(pub Arc<DistanceMatrixClient>);

#[async_trait]
impl BaseDistanceMatrix for DistanceMatrixAdapter {
    async fn travel_time(
        &self,
        origin: LatLng,
        destination: LatLng,
        departure_time: Option<DateTime<Utc>>,
    ) -> Result<TravelLeg> {
        // The API rejects departure times in the past; clamp to now.
        let departure_time = departure_time.map(|at| at.max(Utc::now()));
        let leg = self
            .0
            .travel_time(
                (origin.lat, origin.lng),
                (destination.lat, destination.lng),
                departure_time,
            )
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        Ok(TravelLeg {
            duration_seconds: leg.duration_seconds,
            distance_meters: leg.distance_meters,
        })
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Dependencies the replan core runs against (traits for testability).
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn BaseDispatchStore>,
    pub locations: Arc<dyn BaseLocationService>,
    pub optimizer: Arc<dyn crate::kernel::traits::BaseRouteOptimizer>,
    pub travel_time: Arc<TravelTimeCache>,
    pub settings: ReplanSettings,
}

impl ServerDeps {
    pub fn new(
        store: Arc<dyn BaseDispatchStore>,
        locations: Arc<dyn BaseLocationService>,
        optimizer: Arc<dyn crate::kernel::traits::BaseRouteOptimizer>,
        travel_time: Arc<TravelTimeCache>,
        settings: ReplanSettings,
    ) -> Self {
        Self {
            store,
            locations,
            optimizer,
            travel_time,
            settings,
        }
    }
}
