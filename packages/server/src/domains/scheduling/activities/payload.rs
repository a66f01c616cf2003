//! Optimization payload assembly: the location index, the travel-time
//! matrix, technician shifts and unavailabilities, and the item list.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;

use crate::common::geo::{CoordKey, LatLng};
use crate::common::time::{predictive_departure, utc_date};
use crate::domains::jobs::models::{Job, JobStatus};
use crate::domains::routing::models::{TravelMode, PENALTY_TRAVEL_SECONDS};
use crate::domains::scheduling::models::{
    OptimizationItem, OptimizationPayload, PayloadLocation, PayloadTechnician, SchedulableItem,
    TechnicianUnavailability, TimeWindow,
};
use crate::domains::technicians::models::Technician;
use crate::kernel::deps::ServerDeps;

use super::availability::{
    apply_locked_jobs_to_windows, calculate_windows_for_technician, find_availability_gaps,
};

/// Latitude nudge that splits a technician start from a coinciding item
/// location so each gets its own matrix index.
const PERTURB_LAT: f64 = 0.00001;

/// The assembled payload plus the items that actually made it in. Results
/// processing resolves optimizer item ids against exactly this set.
#[derive(Debug)]
pub struct AssembledPayload {
    pub payload: OptimizationPayload,
    pub items: Vec<SchedulableItem>,
}

/// Build the optimizer payload for one planning date.
///
/// Locked jobs are only meaningful for today's pass; future passes hand
/// in an empty slice. Fixed-time items for other dates are dropped here —
/// each is confirmed by the pass planning its own date.
pub async fn assemble_payload(
    deps: &ServerDeps,
    technicians: &[Technician],
    items: Vec<SchedulableItem>,
    locked_jobs: &[Job],
    target_date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<AssembledPayload> {
    let is_for_today = target_date == utc_date(now);
    let mode = if is_for_today {
        TravelMode::RealTime
    } else {
        TravelMode::Predictive
    };
    let departure_time = if is_for_today {
        Some(now)
    } else {
        Some(predictive_departure(
            target_date,
            deps.settings.predictive_departure_hour_utc,
        ))
    };

    // Items that cannot be placed or timed on this date are excluded up
    // front so the optimizer never sees them.
    let items: Vec<SchedulableItem> = items
        .into_iter()
        .filter(|item| match item {
            SchedulableItem::Single(s) if s.job.status == JobStatus::FixedTime => {
                match s.job.fixed_schedule_time {
                    Some(at) => utc_date(at) == target_date,
                    None => false,
                }
            }
            _ => true,
        })
        .filter(|item| {
            if item.location().is_none() {
                tracing::warn!(
                    item_id = %item.item_id(),
                    "Dropping item without a geocoded address"
                );
                return false;
            }
            true
        })
        .collect();

    // Location index: depot first, then unique item addresses, then
    // technician starts (perturbed off any coinciding address).
    let mut locations: Vec<PayloadLocation> = Vec::new();
    let mut index_by_key: HashMap<CoordKey, usize> = HashMap::new();

    push_location(
        &mut locations,
        &mut index_by_key,
        "depot".to_string(),
        deps.settings.depot_location,
    );

    let mut item_location_index: HashMap<String, usize> = HashMap::new();
    for item in &items {
        let point = item.location().expect("filtered above");
        let index = if index_by_key.contains_key(&point.key()) {
            index_by_key[&point.key()]
        } else {
            let id = format!("location_{}", locations.len());
            push_location(&mut locations, &mut index_by_key, id, point)
        };
        item_location_index.insert(item.item_id(), index);
    }

    let mut tech_start_index: HashMap<i64, usize> = HashMap::new();
    for tech in technicians {
        let mut point = tech_start_point(tech, is_for_today, deps.settings.depot_location);
        // A start that lands exactly on an indexed point gets nudged into
        // its own index; the near-zero legs it adds are acceptable.
        while index_by_key.contains_key(&point.key()) {
            point = LatLng::new(point.lat + PERTURB_LAT, point.lng);
        }
        let index = push_location(
            &mut locations,
            &mut index_by_key,
            format!("technician_{}", tech.id),
            point,
        );
        tech_start_index.insert(tech.id, index);
    }

    // Full travel-time matrix over the final location set.
    let points: Vec<LatLng> = locations
        .iter()
        .map(|l| LatLng::new(l.lat, l.lng))
        .collect();
    let mut pairs: Vec<(LatLng, LatLng)> = Vec::new();
    for (i, from) in points.iter().enumerate() {
        for (j, to) in points.iter().enumerate() {
            if i != j {
                pairs.push((*from, *to));
            }
        }
    }
    let times = deps
        .travel_time
        .bulk_travel_times(&pairs, mode, departure_time)
        .await;

    let travel_time_matrix: Vec<Vec<i64>> = points
        .iter()
        .map(|from| {
            points
                .iter()
                .map(|to| {
                    let key = (from.rounded().key(), to.rounded().key());
                    if key.0 == key.1 {
                        0
                    } else {
                        times.get(&key).copied().unwrap_or(PENALTY_TRAVEL_SECONDS)
                    }
                })
                .collect()
        })
        .collect();

    // Technician shifts and unavailability gaps for the target date.
    let mut payload_technicians: Vec<PayloadTechnician> = Vec::new();
    let mut technician_unavailabilities: Vec<TechnicianUnavailability> = Vec::new();
    for tech in technicians {
        let mut windows = calculate_windows_for_technician(
            tech,
            target_date,
            target_date,
            deps.settings.business_timezone,
        )
        .remove(&target_date)
        .unwrap_or_default();

        if is_for_today {
            windows = apply_locked_jobs_to_windows(windows, locked_jobs, tech.id, target_date, now);
        }

        let start_location_index = tech_start_index[&tech.id];
        let shift = match (windows.first(), windows.last()) {
            (Some(first), Some(last)) => TimeWindow::new(first.start, last.end),
            _ => {
                // No working time: a zero-length midday shift the optimizer
                // cannot place anything into.
                let noon = Utc.from_utc_datetime(
                    &target_date.and_hms_opt(12, 0, 0).expect("noon is valid"),
                );
                TimeWindow::new(noon, noon)
            }
        };

        payload_technicians.push(PayloadTechnician {
            id: tech.id,
            start_location_index,
            end_location_index: start_location_index,
            earliest_start_time_iso: shift.start,
            latest_end_time_iso: shift.end,
        });

        for gap in find_availability_gaps(tech.id, shift, &windows) {
            if gap_matches_fixed_item(&gap.start, &gap.end, tech.id, &items) {
                // The fixed-time item itself already pins this slot.
                continue;
            }
            technician_unavailabilities.push(TechnicianUnavailability {
                technician_id: gap.technician_id,
                start_time_iso: gap.start,
                duration_seconds: gap.duration_seconds,
            });
        }
    }

    // Optimization items.
    let payload_items: Vec<OptimizationItem> = items
        .iter()
        .map(|item| {
            let fixed_time = match item {
                SchedulableItem::Single(s) if s.job.status == JobStatus::FixedTime => {
                    s.job.fixed_schedule_time
                }
                _ => None,
            };
            OptimizationItem {
                id: item.item_id(),
                location_index: item_location_index[&item.item_id()],
                duration_seconds: item.duration_minutes() * 60,
                priority: item.priority(),
                eligible_technician_ids: item.eligible_technician_ids().to_vec(),
                earliest_start_time_iso: item.earliest_start_time(),
                is_fixed_time: fixed_time.is_some(),
                fixed_time_iso: fixed_time,
            }
        })
        .collect();

    Ok(AssembledPayload {
        payload: OptimizationPayload {
            locations,
            technicians: payload_technicians,
            items: payload_items,
            fixed_constraints: Vec::new(),
            travel_time_matrix,
            technician_unavailabilities,
        },
        items,
    })
}

fn push_location(
    locations: &mut Vec<PayloadLocation>,
    index_by_key: &mut HashMap<CoordKey, usize>,
    id: String,
    point: LatLng,
) -> usize {
    let index = locations.len();
    index_by_key.insert(point.key(), index);
    locations.push(PayloadLocation {
        index,
        id,
        lat: point.lat,
        lng: point.lng,
    });
    index
}

fn tech_start_point(tech: &Technician, is_for_today: bool, depot: LatLng) -> LatLng {
    if is_for_today {
        if let Some(current) = tech.current_location {
            return current;
        }
    }
    tech.home_location.unwrap_or(depot)
}

/// True when a gap is exactly the slot of a fixed-time item scheduled this
/// pass on this technician.
fn gap_matches_fixed_item(
    gap_start: &DateTime<Utc>,
    gap_end: &DateTime<Utc>,
    technician_id: i64,
    items: &[SchedulableItem],
) -> bool {
    items.iter().any(|item| match item {
        SchedulableItem::Single(s)
            if s.job.status == JobStatus::FixedTime
                && s.job.assigned_technician == Some(technician_id) =>
        {
            match s.job.fixed_schedule_time {
                Some(at) => at == *gap_start && at + s.job.duration() == *gap_end,
                None => false,
            }
        }
        _ => false,
    })
}
