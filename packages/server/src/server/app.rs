//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use google_maps::DistanceMatrixClient;
use onestep_gps::OneStepGpsClient;

use crate::config::Config;
use crate::domains::routing::data::PgTravelTimeStore;
use crate::domains::routing::TravelTimeCache;
use crate::kernel::deps::NoopLocationService;
use crate::kernel::{
    DistanceMatrixAdapter, OneStepGpsAdapter, OptimizerClient, PgDispatchStore, RunGuard,
    ServerDeps,
};
use crate::server::routes::{health_handler, run_replan_handler};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub deps: ServerDeps,
    pub run_guard: RunGuard,
}

/// Wire the dependency container from live clients.
pub fn build_deps(pool: PgPool, config: &Config) -> anyhow::Result<ServerDeps> {
    let store = Arc::new(PgDispatchStore::new(pool.clone()));

    let locations: Arc<dyn crate::kernel::BaseLocationService> =
        match &config.onestep_gps_api_key {
            Some(key) => Arc::new(OneStepGpsAdapter(Arc::new(OneStepGpsClient::new(
                key.clone(),
            )?))),
            None => Arc::new(NoopLocationService),
        };

    let matrix = Arc::new(DistanceMatrixAdapter(Arc::new(DistanceMatrixClient::new(
        config.google_maps_api_key.clone(),
    )?)));
    let travel_time = Arc::new(TravelTimeCache::new(
        Arc::new(PgTravelTimeStore::new(pool)),
        matrix,
    ));

    let optimizer = Arc::new(OptimizerClient::new(
        config.optimizer_url.clone(),
        config.bypass_optimizer_auth,
    )?);

    Ok(ServerDeps::new(
        store,
        locations,
        optimizer,
        travel_time,
        config.replan.clone(),
    ))
}

/// Build the application router.
pub fn build_app(pool: PgPool, config: &Config) -> anyhow::Result<Router> {
    let state = AppState {
        db_pool: pool.clone(),
        deps: build_deps(pool, config)?,
        run_guard: RunGuard::new(),
    };

    Ok(Router::new()
        .route("/health", get(health_handler))
        .route("/run-replan", post(run_replan_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
