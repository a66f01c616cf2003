//! End-to-end replan runs against mock dependencies.
//!
//! The pinned "now" is Friday 2024-07-19 08:00 UTC throughout, so
//! weekday/weekend behavior is deterministic.

mod common;

use std::sync::Arc;

use common::fixtures::*;
use server_core::domains::jobs::models::JobStatus;
use server_core::domains::routing::TravelTimeCache;
use server_core::domains::scheduling::activities::run_replan_at;
use server_core::kernel::{
    MockDispatchStore, MockDistanceMatrix, MockLocationService, MockRouteOptimizer,
    MockTravelTimeStore, ServerDeps,
};

fn friday_morning() -> chrono::DateTime<chrono::Utc> {
    utc(2024, 7, 19, 8, 0)
}

#[tokio::test]
async fn happy_path_single_day() {
    let store = Arc::new(
        MockDispatchStore::new()
            .with_technicians(vec![technician(1), technician(2)])
            .with_jobs(vec![
                queued_job(101, 1001, 60, 2),
                queued_job(102, 1001, 45, 3),
                queued_job(103, 1002, 90, 1),
                in_progress_job(104, 1003, 1, utc(2024, 7, 19, 10, 0), 60),
            ]),
    );
    let optimizer = Arc::new(MockRouteOptimizer::new().with_response(solver_response(
        vec![
            route(1, vec![stop("bundle_1001", utc(2024, 7, 19, 11, 0))]),
            route(2, vec![stop("job_103", utc(2024, 7, 19, 11, 0))]),
        ],
        &[],
    )));
    let deps = test_deps(store.clone(), optimizer.clone());

    let summary = run_replan_at(&deps, friday_morning()).await.unwrap();

    assert_eq!(summary.scheduled_jobs, 3);
    assert_eq!(summary.pending_review_jobs, 0);
    assert_eq!(summary.optimizer_calls, 1);
    assert_eq!(optimizer.call_count(), 1);
    assert_eq!(store.write_calls(), 1);

    for job_id in [101, 102] {
        let update = store.update_for(job_id).expect("bundle job written");
        assert_eq!(update.data.status, JobStatus::Queued);
        assert_eq!(update.data.assigned_technician, Some(1));
        assert_eq!(update.data.estimated_sched, Some(utc(2024, 7, 19, 11, 0)));
    }
    let update = store.update_for(103).expect("job 103 written");
    assert_eq!(update.data.status, JobStatus::Queued);
    assert_eq!(update.data.assigned_technician, Some(2));

    // The locked in-progress job is not re-planned.
    assert!(store.update_for(104).is_none());
}

#[tokio::test]
async fn unassigned_item_overflows_to_the_next_day() {
    let store = Arc::new(
        MockDispatchStore::new()
            .with_technicians(vec![technician(1), technician(2)])
            .with_jobs(vec![
                queued_job(101, 1001, 60, 2),
                queued_job(102, 1001, 45, 3),
                queued_job(103, 1002, 90, 1),
            ]),
    );
    let optimizer = Arc::new(
        MockRouteOptimizer::new()
            .with_response(solver_response(
                vec![route(1, vec![stop("bundle_1001", utc(2024, 7, 19, 11, 0))])],
                &["job_103"],
            ))
            .with_response(solver_response(
                vec![route(2, vec![stop("job_103", utc(2024, 7, 20, 9, 30))])],
                &[],
            )),
    );
    let deps = test_deps(store.clone(), optimizer.clone());

    let summary = run_replan_at(&deps, friday_morning()).await.unwrap();

    assert_eq!(summary.optimizer_calls, 2);
    assert_eq!(summary.scheduled_jobs, 3);

    let update = store.update_for(103).unwrap();
    assert_eq!(update.data.assigned_technician, Some(2));
    assert_eq!(update.data.estimated_sched, Some(utc(2024, 7, 20, 9, 30)));

    // Jobs scheduled on the first pass are not re-offered on the second.
    let payloads = optimizer.sent_payloads();
    let second_pass_ids: Vec<&str> = payloads[1].items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(second_pass_ids, vec!["job_103"]);
}

#[tokio::test]
async fn exhausted_overflow_finalizes_to_review() {
    let store = Arc::new(
        MockDispatchStore::new()
            .with_technicians(vec![technician(1), technician(2)])
            .with_jobs(vec![
                queued_job(101, 1001, 60, 2),
                queued_job(102, 1001, 45, 3),
                queued_job(103, 1002, 90, 1),
            ]),
    );
    // Every pass rejects everything; the mock repeats its last response.
    let optimizer = Arc::new(MockRouteOptimizer::new().with_response(solver_response(
        vec![],
        &["bundle_1001", "job_103"],
    )));
    let deps = test_deps(store.clone(), optimizer.clone());

    let summary = run_replan_at(&deps, friday_morning()).await.unwrap();

    // Today plus every overflow attempt.
    assert_eq!(optimizer.call_count(), 1 + 4);
    assert_eq!(summary.scheduled_jobs, 0);
    assert_eq!(summary.pending_review_jobs, 3);

    for job_id in [101, 102, 103] {
        let update = store.update_for(job_id).unwrap();
        assert_eq!(update.data.status, JobStatus::PendingReview);
        assert_eq!(update.data.assigned_technician, None);
        assert_eq!(update.data.estimated_sched, None);
    }
}

#[tokio::test]
async fn weekend_days_are_skipped_without_optimizer_calls() {
    let store = Arc::new(
        MockDispatchStore::new()
            .with_technicians(vec![weekday_technician(1), weekday_technician(2)])
            .with_jobs(vec![
                queued_job(101, 1001, 60, 2),
                queued_job(102, 1001, 45, 3),
                queued_job(103, 1002, 90, 1),
            ]),
    );
    let optimizer = Arc::new(
        MockRouteOptimizer::new()
            .with_response(solver_response(
                vec![route(1, vec![stop("bundle_1001", utc(2024, 7, 19, 11, 0))])],
                &["job_103"],
            ))
            // Monday 2024-07-22.
            .with_response(solver_response(
                vec![route(2, vec![stop("job_103", utc(2024, 7, 22, 10, 0))])],
                &[],
            )),
    );
    let deps = test_deps(store.clone(), optimizer.clone());

    let summary = run_replan_at(&deps, friday_morning()).await.unwrap();

    // Friday and Monday only; Saturday and Sunday never reach the solver.
    assert_eq!(optimizer.call_count(), 2);
    assert_eq!(summary.scheduled_jobs, 3);

    let update = store.update_for(103).unwrap();
    assert_eq!(update.data.status, JobStatus::Queued);
    assert_eq!(update.data.estimated_sched, Some(utc(2024, 7, 22, 10, 0)));
}

#[tokio::test]
async fn bundle_break_schedules_jobs_separately() {
    let store = Arc::new(
        MockDispatchStore::new()
            .with_technicians(vec![technician(1), technician(2)])
            .with_jobs(vec![
                queued_job(201, 2001, 60, 1),
                queued_job(202, 2001, 45, 1),
            ])
            .with_van_models(10, &["adas-cal-x"])
            .with_van_models(20, &["adas-cal-y"])
            .with_required_equipment(201, &["adas-cal-x"])
            .with_required_equipment(202, &["adas-cal-y"]),
    );
    let optimizer = Arc::new(MockRouteOptimizer::new().with_response(solver_response(
        vec![
            route(1, vec![stop("job_201", utc(2024, 7, 19, 10, 0))]),
            route(2, vec![stop("job_202", utc(2024, 7, 19, 10, 0))]),
        ],
        &[],
    )));
    let deps = test_deps(store.clone(), optimizer.clone());

    let summary = run_replan_at(&deps, friday_morning()).await.unwrap();

    assert_eq!(summary.scheduled_jobs, 2);
    assert_eq!(store.update_for(201).unwrap().data.assigned_technician, Some(1));
    assert_eq!(store.update_for(202).unwrap().data.assigned_technician, Some(2));

    // The broken bundle went to the optimizer as two single jobs.
    let payload = optimizer.last_payload().unwrap();
    let mut ids: Vec<&str> = payload.items.iter().map(|i| i.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["job_201", "job_202"]);
}

#[tokio::test]
async fn uncoverable_jobs_fail_persistently_without_optimizer() {
    let store = Arc::new(
        MockDispatchStore::new()
            .with_technicians(vec![technician(1), technician(2)])
            .with_jobs(vec![
                queued_job(201, 2001, 60, 1),
                queued_job(202, 2001, 45, 1),
            ])
            .with_van_models(10, &["prog-tool"])
            .with_van_models(20, &["prog-tool"])
            .with_required_equipment(201, &["adas-cal-x"])
            .with_required_equipment(202, &["adas-cal-y"]),
    );
    let optimizer = Arc::new(MockRouteOptimizer::new());
    let deps = test_deps(store.clone(), optimizer.clone());

    let summary = run_replan_at(&deps, friday_morning()).await.unwrap();

    // Persistent equipment failures never reach the solver, and the
    // overflow loop does not retry them.
    assert_eq!(optimizer.call_count(), 0);
    assert_eq!(summary.pending_review_jobs, 2);

    for job_id in [201, 202] {
        let update = store.update_for(job_id).unwrap();
        assert_eq!(update.data.status, JobStatus::PendingReview);
        assert_eq!(update.data.assigned_technician, None);
    }
}

#[tokio::test]
async fn fixed_time_job_is_confirmed_at_its_own_time() {
    let fixed_at = utc(2024, 7, 19, 14, 0);
    let store = Arc::new(
        MockDispatchStore::new()
            .with_technicians(vec![technician(1), technician(2)])
            .with_jobs(vec![
                queued_job(103, 1002, 90, 1),
                fixed_job(401, 4001, Some(1), fixed_at, 60),
            ]),
    );
    let optimizer = Arc::new(MockRouteOptimizer::new().with_response(solver_response(
        vec![route(2, vec![stop("job_103", utc(2024, 7, 19, 11, 0))])],
        &[],
    )));
    let deps = test_deps(store.clone(), optimizer.clone());

    run_replan_at(&deps, friday_morning()).await.unwrap();

    let update = store.update_for(401).expect("fixed job re-asserted");
    assert_eq!(update.data.status, JobStatus::FixedTime);
    assert_eq!(update.data.assigned_technician, Some(1));
    assert_eq!(update.data.estimated_sched, Some(fixed_at));
}

#[tokio::test]
async fn optimizer_error_aborts_the_run_without_writing() {
    let store = Arc::new(
        MockDispatchStore::new()
            .with_technicians(vec![technician(1)])
            .with_jobs(vec![queued_job(101, 1001, 60, 1)]),
    );
    let optimizer =
        Arc::new(MockRouteOptimizer::new().with_response(error_response("solver blew up")));
    let deps = test_deps(store.clone(), optimizer.clone());

    let result = run_replan_at(&deps, friday_morning()).await;

    assert!(result.is_err());
    assert_eq!(store.write_calls(), 0);
}

#[tokio::test]
async fn optimizer_transport_failure_aborts_the_run() {
    let store = Arc::new(
        MockDispatchStore::new()
            .with_technicians(vec![technician(1)])
            .with_jobs(vec![queued_job(101, 1001, 60, 1)]),
    );
    let optimizer = Arc::new(MockRouteOptimizer::failing());
    let deps = test_deps(store.clone(), optimizer.clone());

    let result = run_replan_at(&deps, friday_morning()).await;

    assert!(result.is_err());
    assert_eq!(store.write_calls(), 0);
}

#[tokio::test]
async fn location_fetch_failure_is_tolerated() {
    let store = Arc::new(
        MockDispatchStore::new()
            .with_technicians(vec![technician(1)])
            .with_jobs(vec![queued_job(101, 1001, 60, 1)]),
    );
    let optimizer = Arc::new(MockRouteOptimizer::new().with_response(solver_response(
        vec![route(1, vec![stop("job_101", utc(2024, 7, 19, 11, 0))])],
        &[],
    )));
    let deps = ServerDeps::new(
        store.clone(),
        Arc::new(MockLocationService::failing()),
        optimizer,
        Arc::new(TravelTimeCache::new(
            Arc::new(MockTravelTimeStore::new()),
            Arc::new(MockDistanceMatrix::constant(600)),
        )),
        test_settings(),
    );

    let summary = run_replan_at(&deps, friday_morning()).await.unwrap();
    assert_eq!(summary.scheduled_jobs, 1);
}

#[tokio::test]
async fn live_device_location_is_overlaid_onto_the_technician() {
    let mut tech = technician(1);
    tech.assigned_van.as_mut().unwrap().device_id = Some("dev-1".to_string());

    let store = Arc::new(
        MockDispatchStore::new()
            .with_technicians(vec![tech])
            .with_jobs(vec![queued_job(101, 1001, 60, 1)]),
    );
    let optimizer = Arc::new(MockRouteOptimizer::new().with_response(solver_response(
        vec![route(1, vec![stop("job_101", utc(2024, 7, 19, 11, 0))])],
        &[],
    )));
    let deps = ServerDeps::new(
        store.clone(),
        Arc::new(MockLocationService::new().with_device("dev-1", 51.3, -114.5)),
        optimizer.clone(),
        Arc::new(TravelTimeCache::new(
            Arc::new(MockTravelTimeStore::new()),
            Arc::new(MockDistanceMatrix::constant(600)),
        )),
        test_settings(),
    );

    run_replan_at(&deps, friday_morning()).await.unwrap();

    let payload = optimizer.last_payload().unwrap();
    let tech_start = payload
        .locations
        .iter()
        .find(|l| l.id == "technician_1")
        .expect("technician start location present");
    assert_eq!(tech_start.lat, 51.3);
    assert_eq!(tech_start.lng, -114.5);
}
