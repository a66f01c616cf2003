use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::geo::LatLng;
use crate::domains::jobs::models::Job;

use super::state::FailureReason;

/// One atomic unit handed to the optimizer: a lone job, or all jobs of an
/// order travelling together.
///
/// The item id strings (`job_{id}` / `bundle_{order_id}`) are the contract
/// with the optimizer and must round-trip unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SchedulableItem {
    Single(SingleJobItem),
    Bundle(BundleItem),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleJobItem {
    pub job: Job,
    pub eligible_technician_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleItem {
    pub order_id: i64,
    /// Constituent jobs, in their backlog order.
    pub jobs: Vec<Job>,
    pub total_duration_minutes: i64,
    /// Max of the constituent priorities.
    pub priority: i32,
    pub eligible_technician_ids: Vec<i64>,
}

impl SchedulableItem {
    pub fn item_id(&self) -> String {
        match self {
            SchedulableItem::Single(s) => format!("job_{}", s.job.id),
            SchedulableItem::Bundle(b) => format!("bundle_{}", b.order_id),
        }
    }

    pub fn job_ids(&self) -> Vec<i64> {
        match self {
            SchedulableItem::Single(s) => vec![s.job.id],
            SchedulableItem::Bundle(b) => b.jobs.iter().map(|j| j.id).collect(),
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        match self {
            SchedulableItem::Single(s) => s.job.duration_minutes,
            SchedulableItem::Bundle(b) => b.total_duration_minutes,
        }
    }

    pub fn priority(&self) -> i32 {
        match self {
            SchedulableItem::Single(s) => s.job.priority,
            SchedulableItem::Bundle(b) => b.priority,
        }
    }

    pub fn eligible_technician_ids(&self) -> &[i64] {
        match self {
            SchedulableItem::Single(s) => &s.eligible_technician_ids,
            SchedulableItem::Bundle(b) => &b.eligible_technician_ids,
        }
    }

    /// The service coordinate. Bundles share one address across members.
    pub fn location(&self) -> Option<LatLng> {
        let job = match self {
            SchedulableItem::Single(s) => &s.job,
            SchedulableItem::Bundle(b) => b.jobs.first()?,
        };
        job.address.as_ref().and_then(|a| a.lat_lng())
    }

    /// Earliest the item may start: the order's earliest-available time,
    /// or for bundles the latest such time across members.
    pub fn earliest_start_time(&self) -> Option<DateTime<Utc>> {
        match self {
            SchedulableItem::Single(s) => s.job.earliest_available_time(),
            SchedulableItem::Bundle(b) => b
                .jobs
                .iter()
                .filter_map(|j| j.earliest_available_time())
                .max(),
        }
    }
}

/// An item no technician can perform, with the reason the orchestrator
/// records on each constituent job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IneligibleItem {
    pub item: SchedulableItem,
    pub reason: FailureReason,
}
