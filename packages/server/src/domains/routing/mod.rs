// Routing domain: travel times between service locations, cached in two
// tiers (real-time and predictive-by-hour-of-week) in front of the
// distance-matrix provider

pub mod cache;
pub mod data;
pub mod models;

pub use cache::TravelTimeCache;
pub use models::*;
