//! Pure Google Distance Matrix API client.
//!
//! A minimal client for the Distance Matrix web service. Supports single
//! origin→destination lookups with optional departure time, in which case
//! Google returns traffic-aware durations.
//!
//! # Example
//!
//! ```rust,ignore
//! use google_maps::DistanceMatrixClient;
//!
//! let client = DistanceMatrixClient::new("your-api-key".into())?;
//!
//! let leg = client.travel_time((51.05, -114.07), (51.08, -114.13), None).await?;
//! println!("{}s", leg.duration_seconds);
//! ```

pub mod error;
pub mod types;

pub use error::{MapsError, Result};
pub use types::{MatrixResponse, TravelLeg};

use chrono::{DateTime, Utc};

const BASE_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";

/// Request timeout. Matrix lookups are on the critical path of a replan
/// run, so a slow element is cheaper to drop than to wait for.
const REQUEST_TIMEOUT_SECS: u64 = 10;

pub struct DistanceMatrixClient {
    client: reqwest::Client,
    api_key: String,
}

impl DistanceMatrixClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, api_key })
    }

    /// Look up the driving time for one origin→destination pair.
    ///
    /// When `departure_time` is set, Google computes a traffic-aware
    /// duration (`duration_in_traffic`); otherwise the plain duration is
    /// returned. Departure times in the past are rejected by the API, so
    /// callers should clamp to now-or-later.
    pub async fn travel_time(
        &self,
        origin: (f64, f64),
        destination: (f64, f64),
        departure_time: Option<DateTime<Utc>>,
    ) -> Result<TravelLeg> {
        let mut query = vec![
            ("origins", format!("{},{}", origin.0, origin.1)),
            ("destinations", format!("{},{}", destination.0, destination.1)),
            ("mode", "driving".to_string()),
            ("key", self.api_key.clone()),
        ];
        if let Some(at) = departure_time {
            query.push(("departure_time", at.timestamp().to_string()));
            query.push(("traffic_model", "best_guess".to_string()));
        }

        let resp = self.client.get(BASE_URL).query(&query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MapsError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let matrix: MatrixResponse = resp.json().await?;
        if matrix.status != "OK" {
            return Err(MapsError::Status(format!(
                "{}{}",
                matrix.status,
                matrix
                    .error_message
                    .map(|m| format!(": {}", m))
                    .unwrap_or_default()
            )));
        }

        let element = matrix
            .rows
            .first()
            .and_then(|r| r.elements.first())
            .ok_or_else(|| MapsError::NoRoute("empty matrix response".to_string()))?;

        if element.status != "OK" {
            return Err(MapsError::NoRoute(element.status.clone()));
        }

        // Prefer the traffic-aware duration when the API produced one.
        let duration = element
            .duration_in_traffic
            .as_ref()
            .or(element.duration.as_ref())
            .ok_or_else(|| MapsError::NoRoute("element missing duration".to_string()))?;

        tracing::debug!(
            seconds = duration.value,
            text = %duration.text,
            "Distance Matrix element resolved"
        );

        Ok(TravelLeg {
            duration_seconds: duration.value,
            distance_meters: element.distance.as_ref().map(|d| d.value),
        })
    }
}
