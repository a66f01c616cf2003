use serde::{Deserialize, Serialize};

/// One piece of equipment carried by a van.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VanEquipment {
    pub van_id: i64,
    pub equipment_id: i64,
    /// Equipment model identifier, the unit eligibility is decided in.
    pub model: String,
}
