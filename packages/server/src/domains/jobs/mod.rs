// Jobs domain: service jobs, their orders and addresses

pub mod data;
pub mod models;

pub use models::*;
