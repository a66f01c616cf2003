// Scheduling domain: the replan core. Availability arithmetic, bundling,
// eligibility, payload assembly, results processing and the multi-pass
// orchestrator.

pub mod activities;
pub mod models;

pub use models::*;
