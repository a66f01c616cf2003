use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::domains::scheduling::activities::run_replan;
use crate::server::app::AppState;

#[derive(Serialize)]
pub struct ReplanAccepted {
    status: String,
}

/// Trigger a replan run.
///
/// Returns 202 when a run was started; the work itself happens in a
/// background task. Returns 429 while a run is already in flight.
pub async fn run_replan_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReplanAccepted>) {
    let Some(permit) = state.run_guard.try_acquire() else {
        tracing::warn!("Replan trigger rejected: a run is already in progress");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ReplanAccepted {
                status: "already_running".to_string(),
            }),
        );
    };

    let deps = state.deps.clone();
    tokio::spawn(async move {
        // The permit lives until the run finishes, failed or not.
        let _permit = permit;
        match run_replan(&deps).await {
            Ok(summary) => {
                tracing::info!(
                    run_id = %summary.run_id,
                    scheduled = summary.scheduled_jobs,
                    pending_review = summary.pending_review_jobs,
                    optimizer_calls = summary.optimizer_calls,
                    "Replan run completed"
                );
            }
            Err(e) => {
                tracing::error!(error = format!("{:#}", e), "Replan run failed");
            }
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(ReplanAccepted {
            status: "accepted".to_string(),
        }),
    )
}
