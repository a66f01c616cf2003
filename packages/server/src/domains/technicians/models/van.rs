use serde::{Deserialize, Serialize};

use crate::common::geo::LatLng;

/// A service van. Inventory is loaded separately per run through
/// `equipment_for_vans`, keyed by van id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Van {
    pub id: i64,
    pub name: Option<String>,
    /// GPS tracker identifier, when the van carries one.
    pub device_id: Option<String>,
    /// Last position written back by the tracker sync, if any.
    pub location: Option<LatLng>,
}
