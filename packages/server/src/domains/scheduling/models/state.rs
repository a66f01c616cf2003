use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why an item could not be scheduled on an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    NoEligibleTechnicianEquipment,
    NoAssignedVan,
    OptimizerTimeConstraint,
    OptimizerCapacityConstraint,
    OptimizerOther,
    NoTechnicianAvailability,
    Unknown,
}

impl FailureReason {
    /// Persistent failures will not resolve themselves on a later day;
    /// jobs carrying one are never re-attempted.
    pub fn is_persistent(&self) -> bool {
        matches!(
            self,
            FailureReason::NoEligibleTechnicianEquipment | FailureReason::NoAssignedVan
        )
    }
}

/// Per-job progress through a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Pending,
    Scheduled,
    FailedTransient,
    FailedPersistent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingAttempt {
    pub timestamp: DateTime<Utc>,
    pub planning_day: NaiveDate,
    pub success: bool,
    pub failure_reason: Option<FailureReason>,
    pub assigned_technician: Option<i64>,
    pub assigned_time: Option<DateTime<Utc>>,
}

/// Scheduling state for one job, local to a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSchedulingState {
    pub job_id: i64,
    pub attempts: Vec<SchedulingAttempt>,
    pub last_status: ScheduleStatus,
}

impl JobSchedulingState {
    pub fn pending(job_id: i64) -> Self {
        Self {
            job_id,
            attempts: Vec::new(),
            last_status: ScheduleStatus::Pending,
        }
    }

    /// Still waiting for a slot: never scheduled, and not failed for good.
    pub fn is_open(&self) -> bool {
        matches!(
            self.last_status,
            ScheduleStatus::Pending | ScheduleStatus::FailedTransient
        )
    }
}

/// The assignment a job ends the run with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinalAssignment {
    pub technician_id: i64,
    pub estimated_sched: DateTime<Utc>,
    /// Set when the time came from the job's own fixed schedule rather
    /// than the optimizer.
    pub fixed: bool,
}

/// What a completed run did, for the log line and the trigger response.
#[derive(Debug, Clone, Serialize)]
pub struct ReplanSummary {
    pub run_id: Uuid,
    pub scheduled_jobs: usize,
    pub pending_review_jobs: usize,
    pub passes_run: u32,
    pub optimizer_calls: u32,
}
