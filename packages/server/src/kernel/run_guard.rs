//! Process-wide serialization of replan runs.
//!
//! The trigger endpoint must reject a request while a run is in flight;
//! holding the permit for the duration of the run makes the orchestrator
//! safe against redundant triggers from a single process.

use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct RunGuard {
    inner: Arc<Mutex<()>>,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the permit if no run holds it. Dropping the permit releases it.
    pub fn try_acquire(&self) -> Option<RunPermit> {
        self.inner.clone().try_lock_owned().ok().map(RunPermit)
    }
}

pub struct RunPermit(#[allow(dead_code)] OwnedMutexGuard<()>);
