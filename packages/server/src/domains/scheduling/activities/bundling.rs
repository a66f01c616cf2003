//! Grouping same-order jobs into atomic schedulable units.

use std::collections::HashMap;

use crate::domains::jobs::models::{Job, JobStatus};
use crate::domains::scheduling::models::{BundleItem, SchedulableItem, SingleJobItem};

/// Turn this pass's jobs into schedulable items.
///
/// Fixed-time jobs are always their own item. The rest group by order id:
/// two or more jobs on an order travel as one bundle with summed duration
/// and the max of the priorities, in backlog order. Eligible-technician
/// sets are filled in later by eligibility resolution.
pub fn bundle_jobs(jobs: Vec<Job>) -> Vec<SchedulableItem> {
    let mut items: Vec<SchedulableItem> = Vec::new();
    let mut group_order: Vec<i64> = Vec::new();
    let mut groups: HashMap<i64, Vec<Job>> = HashMap::new();

    for job in jobs {
        if job.status == JobStatus::FixedTime {
            items.push(SchedulableItem::Single(SingleJobItem {
                job,
                eligible_technician_ids: Vec::new(),
            }));
            continue;
        }
        let group = groups.entry(job.order_id).or_default();
        if group.is_empty() {
            group_order.push(job.order_id);
        }
        group.push(job);
    }

    for order_id in group_order {
        let group = groups.remove(&order_id).expect("group recorded above");
        if group.len() == 1 {
            let job = group.into_iter().next().expect("group of one");
            items.push(SchedulableItem::Single(SingleJobItem {
                job,
                eligible_technician_ids: Vec::new(),
            }));
        } else {
            let total_duration_minutes = group.iter().map(|j| j.duration_minutes).sum();
            let priority = group.iter().map(|j| j.priority).max().unwrap_or(0);
            items.push(SchedulableItem::Bundle(BundleItem {
                order_id,
                total_duration_minutes,
                priority,
                jobs: group,
                eligible_technician_ids: Vec::new(),
            }));
        }
    }

    items
}
