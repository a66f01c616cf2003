// Common types and utilities shared across the application

pub mod geo;
pub mod time;

pub use geo::{CoordKey, LatLng};
