// Equipment domain: van inventories and per-vehicle service requirements

pub mod data;
pub mod models;

pub use models::*;
