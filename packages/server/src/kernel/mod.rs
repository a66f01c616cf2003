// Kernel - core infrastructure with dependency injection
//
// ServerDeps holds all external dependencies (database, distance matrix,
// device locations, optimizer) behind traits for testability.
//
// IMPORTANT: Kernel is for INFRASTRUCTURE only, not business logic.
// Business logic belongs in domain layers.

pub mod deps;
pub mod optimizer_client;
pub mod run_guard;
pub mod test_dependencies;
pub mod traits;

pub use deps::{DistanceMatrixAdapter, OneStepGpsAdapter, PgDispatchStore, ServerDeps};
pub use optimizer_client::OptimizerClient;
pub use run_guard::{RunGuard, RunPermit};
pub use test_dependencies::{
    MockDispatchStore, MockDistanceMatrix, MockLocationService, MockRouteOptimizer,
    MockTravelTimeStore,
};
pub use traits::*;
