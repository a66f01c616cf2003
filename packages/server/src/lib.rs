// Field-Service Dispatch Replanner - Server Core
//
// This crate replans service jobs onto mobile technicians: it computes
// technician availability, bundles same-order jobs, resolves equipment
// eligibility, assembles an optimization payload for the route optimizer,
// and applies the returned routes back to the jobs table in one batched
// write. Unresolved jobs are flagged for human review.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
