//! OneStepGPS REST API client.
//!
//! Fetches the latest known positions of all tracked devices on the
//! account. Used to overlay live van locations onto technician records at
//! the start of a replan run.

pub mod models;

pub use models::{Device, DevicePoint};

use models::DeviceListResponse;
use thiserror::Error;

const BASE_URL: &str = "https://track.onestepgps.com/v3/api/public";

/// The position overlay is best-effort; a replan run continues on stale
/// locations rather than waiting on a slow tracker API.
const REQUEST_TIMEOUT_SECS: u64 = 15;

pub type Result<T> = std::result::Result<T, GpsError>;

#[derive(Debug, Error)]
pub enum GpsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OneStepGPS API error {status}: {message}")]
    Api { status: u16, message: String },
}

pub struct OneStepGpsClient {
    client: reqwest::Client,
    api_key: String,
}

impl OneStepGpsClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, api_key })
    }

    /// Fetch the latest device points for every device on the account.
    ///
    /// Devices without a reported position are returned with
    /// `latest_device_point` unset and are skipped by callers.
    pub async fn latest_device_points(&self) -> Result<Vec<Device>> {
        let url = format!("{}/device-info", BASE_URL);
        let resp = self
            .client
            .get(&url)
            .query(&[("lat_lng", "1"), ("api-key", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GpsError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let list: DeviceListResponse = resp.json().await?;
        tracing::debug!(devices = list.result_list.len(), "Fetched device points");
        Ok(list.result_list)
    }
}
