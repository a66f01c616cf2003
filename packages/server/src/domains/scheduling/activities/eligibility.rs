//! Which technicians can perform which items.
//!
//! A technician qualifies for an item when their van carries every
//! required equipment model. Bundles require the union of their jobs'
//! models; a bundle nobody can serve whole is broken back into per-job
//! items so partial coverage is not lost.

use anyhow::Result;
use std::collections::{HashMap, HashSet};

use crate::domains::equipment::models::VanEquipment;
use crate::domains::jobs::models::Job;
use crate::domains::scheduling::models::{
    FailureReason, IneligibleItem, SchedulableItem, SingleJobItem,
};
use crate::domains::technicians::models::Technician;
use crate::kernel::traits::BaseDispatchStore;

#[derive(Debug, Default)]
pub struct EligibilityOutcome {
    pub eligible_items: Vec<SchedulableItem>,
    pub ineligible_items: Vec<IneligibleItem>,
}

/// Technician ids whose van inventory covers `required_models`.
/// A technician without a van carries nothing, so they only qualify when
/// nothing is required.
pub fn find_eligible_technicians(
    required_models: &HashSet<String>,
    technicians: &[Technician],
    van_equipment: &HashMap<i64, Vec<VanEquipment>>,
) -> Vec<i64> {
    technicians
        .iter()
        .filter(|tech| match &tech.assigned_van {
            Some(van) => {
                let inventory: HashSet<&str> = van_equipment
                    .get(&van.id)
                    .map(|items| items.iter().map(|e| e.model.as_str()).collect())
                    .unwrap_or_default();
                required_models.iter().all(|m| inventory.contains(m.as_str()))
            }
            None => required_models.is_empty(),
        })
        .map(|tech| tech.id)
        .collect()
}

/// Resolve eligibility for every item of a pass.
pub async fn resolve_item_eligibility(
    store: &dyn BaseDispatchStore,
    items: Vec<SchedulableItem>,
    technicians: &[Technician],
    van_equipment: &HashMap<i64, Vec<VanEquipment>>,
) -> Result<EligibilityOutcome> {
    let mut outcome = EligibilityOutcome::default();

    for item in items {
        match item {
            SchedulableItem::Single(single) => {
                let placed =
                    resolve_single(store, single, technicians, van_equipment).await?;
                match placed {
                    Ok(eligible) => outcome.eligible_items.push(SchedulableItem::Single(eligible)),
                    Err(ineligible) => outcome.ineligible_items.push(ineligible),
                }
            }
            SchedulableItem::Bundle(mut bundle) => {
                let mut union: HashSet<String> = HashSet::new();
                for job in &bundle.jobs {
                    union.extend(store.required_equipment_for_job(job).await?);
                }
                let eligible = find_eligible_technicians(&union, technicians, van_equipment);

                if !eligible.is_empty() {
                    bundle.eligible_technician_ids = eligible;
                    outcome.eligible_items.push(SchedulableItem::Bundle(bundle));
                    continue;
                }

                // Nobody can take the order whole: evaluate each job on its own.
                tracing::info!(
                    order_id = bundle.order_id,
                    jobs = bundle.jobs.len(),
                    "No technician covers the bundle; breaking it into single jobs"
                );
                for job in bundle.jobs {
                    let single = SingleJobItem {
                        job,
                        eligible_technician_ids: Vec::new(),
                    };
                    match resolve_single(store, single, technicians, van_equipment).await? {
                        Ok(eligible) => {
                            outcome.eligible_items.push(SchedulableItem::Single(eligible))
                        }
                        Err(ineligible) => outcome.ineligible_items.push(ineligible),
                    }
                }
            }
        }
    }

    Ok(outcome)
}

async fn resolve_single(
    store: &dyn BaseDispatchStore,
    mut single: SingleJobItem,
    technicians: &[Technician],
    van_equipment: &HashMap<i64, Vec<VanEquipment>>,
) -> Result<std::result::Result<SingleJobItem, IneligibleItem>> {
    let required = required_models(store, &single.job).await?;
    let eligible = find_eligible_technicians(&required, technicians, van_equipment);

    if eligible.is_empty() {
        Ok(Err(IneligibleItem {
            item: SchedulableItem::Single(single),
            reason: FailureReason::NoEligibleTechnicianEquipment,
        }))
    } else {
        single.eligible_technician_ids = eligible;
        Ok(Ok(single))
    }
}

async fn required_models(store: &dyn BaseDispatchStore, job: &Job) -> Result<HashSet<String>> {
    Ok(store
        .required_equipment_for_job(job)
        .await?
        .into_iter()
        .collect())
}
