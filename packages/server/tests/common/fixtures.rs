//! Shared builders for scheduling tests.
//!
//! All fixtures plan in UTC (business_timezone = UTC) so window bounds in
//! assertions read exactly like the hour strings that produced them.

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

use server_core::common::geo::LatLng;
use server_core::config::ReplanSettings;
use server_core::domains::jobs::models::{Address, Job, JobStatus, OrderSummary};
use server_core::domains::routing::TravelTimeCache;
use server_core::domains::scheduling::models::{OptimizerResponse, OptimizerRoute, RouteStop};
use server_core::domains::technicians::models::{
    AvailabilityException, DefaultHours, ExceptionKind, Technician, Van,
};
use server_core::kernel::{
    MockDispatchStore, MockDistanceMatrix, MockLocationService, MockRouteOptimizer,
    MockTravelTimeStore, ServerDeps,
};

/// The shared service address used by most jobs.
pub const ADDRESS_A: (f64, f64) = (51.05, -114.07);

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// =============================================================================
// Technicians
// =============================================================================

pub fn hours(day_of_week: i32, start: &str, end: &str) -> DefaultHours {
    DefaultHours {
        day_of_week,
        start_time: start.to_string(),
        end_time: end.to_string(),
        is_available: true,
    }
}

/// Technician with a van and 09:00–18:30 hours every day of the week.
pub fn technician(id: i64) -> Technician {
    Technician {
        id,
        user_id: Uuid::new_v4(),
        name: format!("Technician {}", id),
        assigned_van: Some(Van {
            id: id * 10,
            name: Some(format!("Van {}", id)),
            device_id: None,
            location: None,
        }),
        home_location: Some(LatLng::new(51.0 + 0.01 * id as f64, -114.2)),
        current_location: None,
        default_hours: (0..7).map(|d| hours(d, "09:00:00", "18:30:00")).collect(),
        exceptions: Vec::new(),
    }
}

/// Same, but working Monday to Friday only.
pub fn weekday_technician(id: i64) -> Technician {
    let mut tech = technician(id);
    tech.default_hours = (1..=5).map(|d| hours(d, "09:00:00", "18:30:00")).collect();
    tech
}

/// Technician with no assigned van (and therefore no equipment).
pub fn vanless_technician(id: i64) -> Technician {
    let mut tech = technician(id);
    tech.assigned_van = None;
    tech
}

pub fn time_off(date: NaiveDate) -> AvailabilityException {
    AvailabilityException {
        date,
        kind: ExceptionKind::TimeOff,
        is_available: false,
        start_time: None,
        end_time: None,
    }
}

pub fn custom_hours(date: NaiveDate, start: &str, end: &str) -> AvailabilityException {
    AvailabilityException {
        date,
        kind: ExceptionKind::CustomHours,
        is_available: true,
        start_time: Some(start.to_string()),
        end_time: Some(end.to_string()),
    }
}

// =============================================================================
// Jobs
// =============================================================================

pub fn address(id: i64, lat: f64, lng: f64) -> Address {
    Address {
        id,
        street_address: Some(format!("{} Test St", id)),
        lat: Some(lat),
        lng: Some(lng),
    }
}

/// A queued job at [`ADDRESS_A`] with no earliest-available constraint.
pub fn queued_job(id: i64, order_id: i64, duration_minutes: i64, priority: i32) -> Job {
    Job {
        id,
        order_id,
        status: JobStatus::Queued,
        duration_minutes,
        priority,
        assigned_technician: None,
        fixed_schedule_time: None,
        estimated_sched: None,
        address: Some(address(order_id, ADDRESS_A.0, ADDRESS_A.1)),
        service: None,
        order: Some(OrderSummary {
            id: order_id,
            earliest_available_time: None,
            vehicle: None,
        }),
    }
}

pub fn in_progress_job(
    id: i64,
    order_id: i64,
    technician_id: i64,
    start: DateTime<Utc>,
    duration_minutes: i64,
) -> Job {
    let mut job = queued_job(id, order_id, duration_minutes, 1);
    job.status = JobStatus::InProgress;
    job.assigned_technician = Some(technician_id);
    job.estimated_sched = Some(start);
    job
}

pub fn fixed_job(
    id: i64,
    order_id: i64,
    technician_id: Option<i64>,
    fixed_time: DateTime<Utc>,
    duration_minutes: i64,
) -> Job {
    let mut job = queued_job(id, order_id, duration_minutes, 1);
    job.status = JobStatus::FixedTime;
    job.assigned_technician = technician_id;
    job.fixed_schedule_time = Some(fixed_time);
    job
}

pub fn with_earliest_available(mut job: Job, at: DateTime<Utc>) -> Job {
    job.order = Some(OrderSummary {
        id: job.order_id,
        earliest_available_time: Some(at),
        vehicle: None,
    });
    job
}

// =============================================================================
// Optimizer responses
// =============================================================================

pub fn stop(item_id: &str, start: DateTime<Utc>) -> RouteStop {
    RouteStop {
        item_id: item_id.to_string(),
        start_time_iso: start,
    }
}

pub fn route(technician_id: i64, stops: Vec<RouteStop>) -> OptimizerRoute {
    OptimizerRoute {
        technician_id,
        stops,
    }
}

pub fn solver_response(routes: Vec<OptimizerRoute>, unassigned: &[&str]) -> OptimizerResponse {
    OptimizerResponse {
        status: "success".to_string(),
        message: None,
        routes,
        unassigned_item_ids: unassigned.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn error_response(message: &str) -> OptimizerResponse {
    OptimizerResponse {
        status: "error".to_string(),
        message: Some(message.to_string()),
        routes: Vec::new(),
        unassigned_item_ids: Vec::new(),
    }
}

// =============================================================================
// Deps wiring
// =============================================================================

pub fn test_settings() -> ReplanSettings {
    ReplanSettings {
        max_overflow_attempts: 4,
        business_timezone: chrono_tz::UTC,
        depot_location: LatLng::new(51.0447, -114.0719),
        predictive_departure_hour_utc: 15,
    }
}

/// Deps over the given store and optimizer, a working in-memory travel
/// cache and no live device locations.
pub fn test_deps(store: Arc<MockDispatchStore>, optimizer: Arc<MockRouteOptimizer>) -> ServerDeps {
    ServerDeps::new(
        store,
        Arc::new(MockLocationService::new()),
        optimizer,
        Arc::new(TravelTimeCache::new(
            Arc::new(MockTravelTimeStore::new()),
            Arc::new(MockDistanceMatrix::constant(600)),
        )),
        test_settings(),
    )
}
