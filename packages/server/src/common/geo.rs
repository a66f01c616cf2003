use serde::{Deserialize, Serialize};

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Integer map key for a coordinate: micro-degrees of the 6-decimal
/// rounding. Raw floats are never used as map keys.
pub type CoordKey = (i64, i64);

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Round to exactly 6 decimal places (~0.1 m). Applied at every cache
    /// insert and lookup so equal points always produce equal keys.
    pub fn rounded(self) -> Self {
        Self {
            lat: round6(self.lat),
            lng: round6(self.lng),
        }
    }

    pub fn key(self) -> CoordKey {
        (
            (self.lat * 1_000_000.0).round() as i64,
            (self.lng * 1_000_000.0).round() as i64,
        )
    }
}

/// Round a coordinate component to 6 decimal places.
pub fn round6(v: f64) -> f64 {
    (v * 1_000_000.0).round() / 1_000_000.0
}
