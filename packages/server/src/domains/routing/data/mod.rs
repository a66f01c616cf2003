pub mod cache;

pub use cache::PgTravelTimeStore;
