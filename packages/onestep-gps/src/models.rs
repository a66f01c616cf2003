use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One tracked device as returned by the device-info endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    pub device_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub latest_device_point: Option<DevicePoint>,
}

/// Latest known position of a device.
#[derive(Debug, Clone, Deserialize)]
pub struct DevicePoint {
    pub lat: f64,
    pub lng: f64,
    pub dt_tracker: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeviceListResponse {
    pub result_list: Vec<Device>,
}
