pub mod job;
pub mod order;

pub use job::{Job, JobStatus, JobUpdate, JobUpdateData};
pub use order::{Address, OrderSummary, Service, ServiceCategory, VehicleInfo};
