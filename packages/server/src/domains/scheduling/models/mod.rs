pub mod item;
pub mod payload;
pub mod state;
pub mod window;

pub use item::{BundleItem, IneligibleItem, SchedulableItem, SingleJobItem};
pub use payload::{
    FixedConstraint, OptimizationItem, OptimizationPayload, OptimizerResponse, OptimizerRoute,
    PayloadLocation, PayloadTechnician, RouteStop, TechnicianUnavailability,
};
pub use state::{
    FailureReason, FinalAssignment, JobSchedulingState, ReplanSummary, ScheduleStatus,
    SchedulingAttempt,
};
pub use window::{AvailabilityGap, DailyAvailability, TimeWindow};
