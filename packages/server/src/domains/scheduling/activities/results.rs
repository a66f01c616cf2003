//! Turning the optimizer's routes back into per-job assignments.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::domains::scheduling::models::{OptimizerResponse, SchedulableItem};

/// A job the optimizer placed: who does it, and when it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledJobUpdate {
    pub job_id: i64,
    pub technician_id: i64,
    pub estimated_sched: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ProcessedResults {
    pub scheduled: Vec<ScheduledJobUpdate>,
    /// Item ids the optimizer could not place, verbatim.
    pub unassigned_item_ids: Vec<String>,
}

/// Fan the optimizer response out to per-job updates.
///
/// A bundle stop produces one update per constituent job, all at the
/// stop's start time: the bundle occupies the slot as one contiguous
/// block. Stops referencing unknown item ids are warned about and
/// skipped. A response with `status == "error"` fails the whole pass.
pub fn process_optimizer_response(
    response: &OptimizerResponse,
    items_by_id: &HashMap<String, SchedulableItem>,
) -> Result<ProcessedResults> {
    if response.status == "error" {
        bail!(
            "optimizer returned an error: {}",
            response.message.as_deref().unwrap_or("(no message)")
        );
    }

    let mut results = ProcessedResults::default();

    for route in &response.routes {
        for stop in &route.stops {
            let Some(item) = items_by_id.get(&stop.item_id) else {
                tracing::warn!(
                    item_id = %stop.item_id,
                    technician_id = route.technician_id,
                    "Optimizer returned a stop for an unknown item; ignoring"
                );
                continue;
            };
            for job_id in item.job_ids() {
                results.scheduled.push(ScheduledJobUpdate {
                    job_id,
                    technician_id: route.technician_id,
                    estimated_sched: stop.start_time_iso,
                });
            }
        }
    }

    results.unassigned_item_ids = response.unassigned_item_ids.clone();

    Ok(results)
}
