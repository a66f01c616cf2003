pub mod cache_entry;

pub use cache_entry::{TravelMode, TravelTimeCacheEntry, PENALTY_TRAVEL_SECONDS};
