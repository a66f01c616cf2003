pub mod equipment;

pub use equipment::{required_models_for_job, ymm_id_for_order};
