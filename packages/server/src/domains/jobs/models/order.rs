use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::geo::LatLng;

/// A service address. Coordinates may be missing for addresses that have
/// not been geocoded yet; such jobs cannot be routed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub id: i64,
    pub street_address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl Address {
    pub fn lat_lng(&self) -> Option<LatLng> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)),
            _ => None,
        }
    }
}

/// Order fields the planner cares about, joined onto each job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: i64,
    pub earliest_available_time: Option<DateTime<Utc>>,
    pub vehicle: Option<VehicleInfo>,
}

/// Year/make/model of the vehicle on an order. Resolves to a `ymm_id`
/// through the reference table for equipment-requirement lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleInfo {
    pub year: i32,
    pub make: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub name: Option<String>,
    pub category: ServiceCategory,
}

/// Service category. Equipment models carry the same categories, which
/// drives the generic-fallback requirement lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Adas,
    Airbag,
    Immo,
    Prog,
    Diag,
}

impl ServiceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Adas => "adas",
            ServiceCategory::Airbag => "airbag",
            ServiceCategory::Immo => "immo",
            ServiceCategory::Prog => "prog",
            ServiceCategory::Diag => "diag",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "adas" => Some(ServiceCategory::Adas),
            "airbag" => Some(ServiceCategory::Airbag),
            "immo" => Some(ServiceCategory::Immo),
            "prog" => Some(ServiceCategory::Prog),
            "diag" => Some(ServiceCategory::Diag),
            _ => None,
        }
    }
}
