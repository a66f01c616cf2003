pub mod availability;
pub mod bundling;
pub mod eligibility;
pub mod orchestrator;
pub mod payload;
pub mod results;

pub use availability::{
    apply_locked_jobs_to_windows, calculate_windows_for_technician, find_availability_gaps,
};
pub use bundling::bundle_jobs;
pub use eligibility::{find_eligible_technicians, resolve_item_eligibility, EligibilityOutcome};
pub use orchestrator::{run_replan, run_replan_at};
pub use payload::assemble_payload;
pub use results::{process_optimizer_response, ProcessedResults, ScheduledJobUpdate};
