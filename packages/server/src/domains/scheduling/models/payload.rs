//! Wire types for the route-optimizer RPC. Field names are the service's
//! JSON contract; do not rename.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationPayload {
    pub locations: Vec<PayloadLocation>,
    pub technicians: Vec<PayloadTechnician>,
    pub items: Vec<OptimizationItem>,
    /// Reserved; fixed-time work is expressed on the items themselves.
    pub fixed_constraints: Vec<FixedConstraint>,
    /// Seconds between every pair of locations, indexed by location index.
    pub travel_time_matrix: Vec<Vec<i64>>,
    pub technician_unavailabilities: Vec<TechnicianUnavailability>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadLocation {
    pub index: usize,
    pub id: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadTechnician {
    pub id: i64,
    pub start_location_index: usize,
    pub end_location_index: usize,
    #[serde(rename = "earliestStartTimeISO")]
    pub earliest_start_time_iso: DateTime<Utc>,
    #[serde(rename = "latestEndTimeISO")]
    pub latest_end_time_iso: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationItem {
    /// `job_{id}` or `bundle_{order_id}`.
    pub id: String,
    pub location_index: usize,
    pub duration_seconds: i64,
    pub priority: i32,
    pub eligible_technician_ids: Vec<i64>,
    #[serde(rename = "earliestStartTimeISO", default, skip_serializing_if = "Option::is_none")]
    pub earliest_start_time_iso: Option<DateTime<Utc>>,
    pub is_fixed_time: bool,
    #[serde(rename = "fixedTimeISO", default, skip_serializing_if = "Option::is_none")]
    pub fixed_time_iso: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedConstraint {
    pub item_id: String,
    #[serde(rename = "fixedTimeISO")]
    pub fixed_time_iso: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianUnavailability {
    pub technician_id: i64,
    #[serde(rename = "startTimeISO")]
    pub start_time_iso: DateTime<Utc>,
    pub duration_seconds: i64,
}

// =============================================================================
// Response
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerResponse {
    /// "success", "partial" or "error".
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<OptimizerRoute>,
    #[serde(default)]
    pub unassigned_item_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerRoute {
    pub technician_id: i64,
    pub stops: Vec<RouteStop>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStop {
    pub item_id: String,
    #[serde(rename = "startTimeISO")]
    pub start_time_iso: DateTime<Utc>,
}
