// Technicians domain: mobile workers, their vans, and working hours

pub mod data;
pub mod models;

pub use models::*;
