//! The multi-pass replan loop.
//!
//! One run: fetch everything, plan today around locked work, then walk
//! forward one day at a time until the backlog is placed or the overflow
//! budget runs out, then write every job's outcome back in one batch.
//! Jobs nobody can serve, or that the optimizer kept rejecting, end the
//! run as `pending_review`.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::common::geo::LatLng;
use crate::common::time::utc_date;
use crate::domains::jobs::models::{Job, JobStatus, JobUpdate, JobUpdateData};
use crate::domains::scheduling::models::{
    FailureReason, FinalAssignment, JobSchedulingState, ReplanSummary, ScheduleStatus,
    SchedulableItem, SchedulingAttempt,
};
use crate::domains::technicians::models::Technician;
use crate::kernel::deps::ServerDeps;

use super::availability::calculate_windows_for_technician;
use super::bundling::bundle_jobs;
use super::eligibility::resolve_item_eligibility;
use super::payload::assemble_payload;
use super::results::process_optimizer_response;

/// Run one full replan. Any infrastructure failure (reads, optimizer,
/// final write) aborts before or during the single batched write; per-item
/// failures are recorded in the run state and never abort.
pub async fn run_replan(deps: &ServerDeps) -> Result<ReplanSummary> {
    run_replan_at(deps, Utc::now()).await
}

/// [`run_replan`] pinned to an explicit "now"; today and every overflow
/// date derive from it.
pub async fn run_replan_at(deps: &ServerDeps, now: DateTime<Utc>) -> Result<ReplanSummary> {
    let run_id = Uuid::new_v4();
    let today = utc_date(now);

    tracing::info!(%run_id, %today, "Replan run starting");

    // Phase 0: fetch and enrich.
    let (mut technicians, relevant_jobs, fixed_jobs) = tokio::try_join!(
        deps.store.active_technicians(),
        deps.store.relevant_jobs(),
        deps.store.jobs_by_status(&[JobStatus::FixedTime]),
    )
    .context("initial fetch failed")?;

    overlay_device_locations(deps, &mut technicians).await;

    let mut run = RunState::new(run_id, &relevant_jobs, &fixed_jobs);
    tracing::info!(
        %run_id,
        technicians = technicians.len(),
        relevant_jobs = relevant_jobs.len(),
        fixed_jobs = fixed_jobs.len(),
        queued = run.states.len(),
        "Fetched planning inputs"
    );

    // Phase 1: today.
    let locked_jobs: Vec<Job> = relevant_jobs
        .iter()
        .filter(|j| j.status.is_locked())
        .cloned()
        .collect();
    let pending_today: Vec<Job> = run.open_jobs();

    if !pending_today.is_empty() {
        run.passes_run += 1;
        execute_pass(
            deps,
            &mut run,
            &technicians,
            pending_today,
            &locked_jobs,
            today,
            now,
        )
        .await
        .with_context(|| format!("today pass ({}) failed", today))?;
    }
    confirm_fixed_jobs_for_date(&mut run, &fixed_jobs, today, now);

    // Phase 2: overflow days.
    for loop_count in 1..=deps.settings.max_overflow_attempts {
        if !run.has_open_jobs() {
            break;
        }
        let target_date = today + Duration::days(loop_count as i64);

        // Defaults and exceptions may have changed since the run started.
        let technicians = deps
            .store
            .active_technicians()
            .await
            .context("technician refresh failed")?;

        let anyone_available = technicians.iter().any(|tech| {
            calculate_windows_for_technician(
                tech,
                target_date,
                target_date,
                deps.settings.business_timezone,
            )
            .contains_key(&target_date)
        });
        if !anyone_available {
            tracing::info!(%run_id, %target_date, "No technician availability; skipping day");
            for job_id in run.open_job_ids() {
                run.mark_failure(
                    job_id,
                    FailureReason::NoTechnicianAvailability,
                    target_date,
                    now,
                );
            }
            continue;
        }

        let mut jobs_for_pass: Vec<Job> = run
            .open_jobs()
            .into_iter()
            .filter(|job| {
                // A fixed slot in the past cannot be reached any more.
                !(job.status == JobStatus::FixedTime
                    && job
                        .fixed_schedule_time
                        .map(|at| utc_date(at) < target_date)
                        .unwrap_or(false))
            })
            .collect();

        // Fixed jobs landing on this date ride along so the optimizer
        // routes around them; their own data wins over the backlog copy.
        for fixed in fixed_jobs
            .iter()
            .filter(|j| j.fixed_schedule_time.map(utc_date) == Some(target_date))
        {
            match jobs_for_pass.iter_mut().find(|j| j.id == fixed.id) {
                Some(existing) => *existing = fixed.clone(),
                None => jobs_for_pass.push(fixed.clone()),
            }
        }

        if jobs_for_pass.is_empty() {
            continue;
        }

        run.passes_run += 1;
        execute_pass(
            deps,
            &mut run,
            &technicians,
            jobs_for_pass,
            &[],
            target_date,
            now,
        )
        .await
        .with_context(|| format!("overflow pass {} ({}) failed", loop_count, target_date))?;

        confirm_fixed_jobs_for_date(&mut run, &fixed_jobs, target_date, now);
    }

    // Phase 3: one batched write.
    let updates = run.build_final_updates();
    let summary = run.summary();
    tracing::info!(
        %run_id,
        scheduled = summary.scheduled_jobs,
        pending_review = summary.pending_review_jobs,
        passes = summary.passes_run,
        optimizer_calls = summary.optimizer_calls,
        updates = updates.len(),
        "Replan run finished; writing results"
    );
    deps.store
        .update_jobs(&updates)
        .await
        .context("final job write failed")?;

    Ok(summary)
}

/// One {bundle → eligibility → payload → solve → apply} iteration for a
/// single target date.
async fn execute_pass(
    deps: &ServerDeps,
    run: &mut RunState,
    technicians: &[Technician],
    jobs: Vec<Job>,
    locked_jobs: &[Job],
    target_date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<()> {
    let items = bundle_jobs(jobs);

    let van_ids: Vec<i64> = technicians
        .iter()
        .filter_map(|t| t.assigned_van.as_ref().map(|v| v.id))
        .collect();
    let van_equipment = deps
        .store
        .equipment_for_vans(&van_ids)
        .await
        .context("van equipment fetch failed")?;

    let outcome =
        resolve_item_eligibility(deps.store.as_ref(), items, technicians, &van_equipment)
            .await
            .context("eligibility resolution failed")?;

    for ineligible in &outcome.ineligible_items {
        for job_id in ineligible.item.job_ids() {
            run.mark_failure(job_id, ineligible.reason, target_date, now);
        }
    }

    if outcome.eligible_items.is_empty() {
        tracing::info!(%target_date, "No eligible items this pass; skipping optimizer");
        return Ok(());
    }

    let assembled = assemble_payload(
        deps,
        technicians,
        outcome.eligible_items,
        locked_jobs,
        target_date,
        now,
    )
    .await
    .context("payload assembly failed")?;

    if assembled.items.is_empty() {
        tracing::info!(%target_date, "No routable items this pass; skipping optimizer");
        return Ok(());
    }

    run.optimizer_calls += 1;
    let response = deps
        .optimizer
        .solve(&assembled.payload)
        .await
        .context("optimizer call failed")?;

    let items_by_id: HashMap<String, SchedulableItem> = assembled
        .items
        .into_iter()
        .map(|item| (item.item_id(), item))
        .collect();
    let results = process_optimizer_response(&response, &items_by_id)?;

    for scheduled in results.scheduled {
        run.mark_scheduled(
            scheduled.job_id,
            scheduled.technician_id,
            scheduled.estimated_sched,
            target_date,
            now,
        );
    }

    for item_id in &results.unassigned_item_ids {
        let Some(item) = items_by_id.get(item_id) else {
            tracing::warn!(%item_id, "Optimizer reported an unknown item as unassigned");
            continue;
        };
        for job_id in item.job_ids() {
            run.mark_failure(job_id, FailureReason::OptimizerOther, target_date, now);
        }
    }

    Ok(())
}

/// Force fixed-time jobs landing on `date` to their own time and
/// technician, overriding whatever the solver said about them.
fn confirm_fixed_jobs_for_date(
    run: &mut RunState,
    fixed_jobs: &[Job],
    date: NaiveDate,
    now: DateTime<Utc>,
) {
    for job in fixed_jobs {
        let Some(fixed_time) = job.fixed_schedule_time else {
            continue;
        };
        if utc_date(fixed_time) != date {
            continue;
        }
        if run.status_of(job.id) == Some(ScheduleStatus::FailedPersistent) {
            continue;
        }
        let Some(technician_id) = job.assigned_technician else {
            tracing::warn!(
                job_id = job.id,
                "Fixed-time job has no assigned technician; flagging for review"
            );
            run.mark_failure(job.id, FailureReason::NoAssignedVan, date, now);
            continue;
        };
        run.confirm_fixed(job.id, technician_id, fixed_time, date, now);
    }
}

async fn overlay_device_locations(deps: &ServerDeps, technicians: &mut [Technician]) {
    let locations = match deps.locations.device_locations().await {
        Ok(locations) => locations,
        Err(e) => {
            tracing::warn!(error = %e, "Device location fetch failed; using stored van positions");
            return;
        }
    };

    let mut overlaid = 0;
    for tech in technicians.iter_mut() {
        let Some(device_id) = tech.assigned_van.as_ref().and_then(|v| v.device_id.clone())
        else {
            continue;
        };
        if let Some(point) = locations.get(&device_id) {
            tech.current_location = Some(LatLng::new(point.lat, point.lng));
            overlaid += 1;
        }
    }
    tracing::debug!(overlaid, "Overlaid live device locations");
}

// =============================================================================
// Run state
// =============================================================================

struct RunState {
    run_id: Uuid,
    states: HashMap<i64, JobSchedulingState>,
    final_assignments: HashMap<i64, FinalAssignment>,
    jobs_by_id: HashMap<i64, Job>,
    passes_run: u32,
    optimizer_calls: u32,
}

impl RunState {
    fn new(run_id: Uuid, relevant_jobs: &[Job], fixed_jobs: &[Job]) -> Self {
        let mut jobs_by_id: HashMap<i64, Job> = HashMap::new();
        for job in relevant_jobs.iter().chain(fixed_jobs.iter()) {
            jobs_by_id.insert(job.id, job.clone());
        }

        let states = relevant_jobs
            .iter()
            .filter(|j| j.status == JobStatus::Queued)
            .map(|j| (j.id, JobSchedulingState::pending(j.id)))
            .collect();

        Self {
            run_id,
            states,
            final_assignments: HashMap::new(),
            jobs_by_id,
            passes_run: 0,
            optimizer_calls: 0,
        }
    }

    fn status_of(&self, job_id: i64) -> Option<ScheduleStatus> {
        self.states.get(&job_id).map(|s| s.last_status)
    }

    fn has_open_jobs(&self) -> bool {
        self.states.values().any(|s| s.is_open())
    }

    fn open_job_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .states
            .values()
            .filter(|s| s.is_open())
            .map(|s| s.job_id)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn open_jobs(&self) -> Vec<Job> {
        self.open_job_ids()
            .into_iter()
            .filter_map(|id| self.jobs_by_id.get(&id).cloned())
            .collect()
    }

    /// Transition a solver-placed job to scheduled. Jobs already
    /// scheduled or persistently failed are left alone.
    fn mark_scheduled(
        &mut self,
        job_id: i64,
        technician_id: i64,
        estimated_sched: DateTime<Utc>,
        planning_day: NaiveDate,
        now: DateTime<Utc>,
    ) {
        let Some(state) = self.states.get_mut(&job_id) else {
            tracing::warn!(
                run_id = %self.run_id,
                job_id,
                "Optimizer scheduled a job outside the run state; ignoring"
            );
            return;
        };
        if !state.is_open() {
            tracing::warn!(
                run_id = %self.run_id,
                job_id,
                status = ?state.last_status,
                "Optimizer scheduled a job that is no longer open; ignoring"
            );
            return;
        }
        state.last_status = ScheduleStatus::Scheduled;
        state.attempts.push(SchedulingAttempt {
            timestamp: now,
            planning_day,
            success: true,
            failure_reason: None,
            assigned_technician: Some(technician_id),
            assigned_time: Some(estimated_sched),
        });
        self.final_assignments.insert(
            job_id,
            FinalAssignment {
                technician_id,
                estimated_sched,
                fixed: false,
            },
        );
    }

    /// Record a failed attempt. Persistent reasons stick; scheduled jobs
    /// and already-persistent jobs are never downgraded.
    fn mark_failure(
        &mut self,
        job_id: i64,
        reason: FailureReason,
        planning_day: NaiveDate,
        now: DateTime<Utc>,
    ) {
        let state = self
            .states
            .entry(job_id)
            .or_insert_with(|| JobSchedulingState::pending(job_id));
        if matches!(
            state.last_status,
            ScheduleStatus::Scheduled | ScheduleStatus::FailedPersistent
        ) {
            return;
        }
        state.last_status = if reason.is_persistent() {
            ScheduleStatus::FailedPersistent
        } else {
            ScheduleStatus::FailedTransient
        };
        state.attempts.push(SchedulingAttempt {
            timestamp: now,
            planning_day,
            success: false,
            failure_reason: Some(reason),
            assigned_technician: None,
            assigned_time: None,
        });
    }

    /// Pin a fixed-time job to its own slot, overriding any solver result
    /// recorded for it this run.
    fn confirm_fixed(
        &mut self,
        job_id: i64,
        technician_id: i64,
        fixed_time: DateTime<Utc>,
        planning_day: NaiveDate,
        now: DateTime<Utc>,
    ) {
        self.final_assignments.insert(
            job_id,
            FinalAssignment {
                technician_id,
                estimated_sched: fixed_time,
                fixed: true,
            },
        );
        if let Some(state) = self.states.get_mut(&job_id) {
            state.last_status = ScheduleStatus::Scheduled;
            state.attempts.push(SchedulingAttempt {
                timestamp: now,
                planning_day,
                success: true,
                failure_reason: None,
                assigned_technician: Some(technician_id),
                assigned_time: Some(fixed_time),
            });
        }
    }

    /// Every job's end-of-run write. Scheduled jobs keep their assignment
    /// (fixed-time jobs keep the fixed_time status); everything else still
    /// in the state map goes to review with cleared assignment. Confirmed
    /// fixed jobs outside the state map are re-asserted as fixed_time.
    fn build_final_updates(&self) -> Vec<JobUpdate> {
        let mut updates: Vec<JobUpdate> = Vec::new();

        for (job_id, state) in &self.states {
            let data = match state.last_status {
                ScheduleStatus::Scheduled => match self.final_assignments.get(job_id) {
                    Some(assignment) => {
                        let was_fixed = self
                            .jobs_by_id
                            .get(job_id)
                            .map(|j| j.status == JobStatus::FixedTime)
                            .unwrap_or(false);
                        JobUpdateData {
                            status: if was_fixed || assignment.fixed {
                                JobStatus::FixedTime
                            } else {
                                JobStatus::Queued
                            },
                            assigned_technician: Some(assignment.technician_id),
                            estimated_sched: Some(assignment.estimated_sched),
                        }
                    }
                    None => {
                        tracing::warn!(
                            run_id = %self.run_id,
                            job_id,
                            "Scheduled job has no recorded assignment; sending to review"
                        );
                        review_update()
                    }
                },
                ScheduleStatus::Pending
                | ScheduleStatus::FailedTransient
                | ScheduleStatus::FailedPersistent => review_update(),
            };
            updates.push(JobUpdate {
                job_id: *job_id,
                data,
            });
        }

        for (job_id, assignment) in &self.final_assignments {
            if assignment.fixed && !self.states.contains_key(job_id) {
                updates.push(JobUpdate {
                    job_id: *job_id,
                    data: JobUpdateData {
                        status: JobStatus::FixedTime,
                        assigned_technician: Some(assignment.technician_id),
                        estimated_sched: Some(assignment.estimated_sched),
                    },
                });
            }
        }

        updates.sort_by_key(|u| u.job_id);
        updates
    }

    fn summary(&self) -> ReplanSummary {
        let scheduled_in_state = self
            .states
            .values()
            .filter(|s| s.last_status == ScheduleStatus::Scheduled)
            .count();
        let confirmed_outside_state = self
            .final_assignments
            .iter()
            .filter(|(job_id, a)| a.fixed && !self.states.contains_key(*job_id))
            .count();
        ReplanSummary {
            run_id: self.run_id,
            scheduled_jobs: scheduled_in_state + confirmed_outside_state,
            pending_review_jobs: self
                .states
                .values()
                .filter(|s| s.last_status != ScheduleStatus::Scheduled)
                .count(),
            passes_run: self.passes_run,
            optimizer_calls: self.optimizer_calls,
        }
    }
}

fn review_update() -> JobUpdateData {
    JobUpdateData {
        status: JobStatus::PendingReview,
        assigned_technician: None,
        estimated_sched: None,
    }
}
