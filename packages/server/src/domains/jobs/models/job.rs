use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::order::{Address, OrderSummary, Service};

/// A service job, joined with its address, service and order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub order_id: i64,
    pub status: JobStatus,
    pub duration_minutes: i64,
    /// Higher is more urgent.
    pub priority: i32,
    pub assigned_technician: Option<i64>,
    pub fixed_schedule_time: Option<DateTime<Utc>>,
    pub estimated_sched: Option<DateTime<Utc>>,
    pub address: Option<Address>,
    pub service: Option<Service>,
    pub order: Option<OrderSummary>,
}

impl Job {
    /// The instant this job occupies its technician from, for locked jobs.
    /// Fixed-time jobs start at their fixed time; en-route/in-progress jobs
    /// at their estimated schedule.
    pub fn locked_start(&self) -> Option<DateTime<Utc>> {
        match self.status {
            JobStatus::FixedTime => self.fixed_schedule_time,
            JobStatus::EnRoute | JobStatus::InProgress => self.estimated_sched,
            _ => None,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.duration_minutes)
    }

    pub fn earliest_available_time(&self) -> Option<DateTime<Utc>> {
        self.order.as_ref().and_then(|o| o.earliest_available_time)
    }
}

/// Job lifecycle status. The planner only ever writes back `queued`,
/// `fixed_time` and `pending_review`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    EnRoute,
    InProgress,
    FixedTime,
    PendingReview,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::EnRoute => "en_route",
            JobStatus::InProgress => "in_progress",
            JobStatus::FixedTime => "fixed_time",
            JobStatus::PendingReview => "pending_review",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(JobStatus::Queued),
            "en_route" => Some(JobStatus::EnRoute),
            "in_progress" => Some(JobStatus::InProgress),
            "fixed_time" => Some(JobStatus::FixedTime),
            "pending_review" => Some(JobStatus::PendingReview),
            "completed" => Some(JobStatus::Completed),
            "cancelled" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }

    /// Statuses whose time on the technician's day is not re-planned.
    pub fn is_locked(&self) -> bool {
        matches!(
            self,
            JobStatus::EnRoute | JobStatus::InProgress | JobStatus::FixedTime
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One write-back for a job at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobUpdate {
    pub job_id: i64,
    pub data: JobUpdateData,
}

/// The written fields. `None` for technician/schedule means an explicit
/// NULL in the database, not "leave unchanged".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobUpdateData {
    pub status: JobStatus,
    pub assigned_technician: Option<i64>,
    pub estimated_sched: Option<DateTime<Utc>>,
}
