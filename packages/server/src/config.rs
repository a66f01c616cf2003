use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::common::geo::LatLng;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub google_maps_api_key: String,
    pub onestep_gps_api_key: Option<String>,
    pub optimizer_url: String,
    pub bypass_optimizer_auth: bool,
    pub replan: ReplanSettings,
}

/// Planner knobs consumed by the orchestrator and payload assembler.
///
/// Kept separate from `Config` so tests can construct them without touching
/// the environment.
#[derive(Debug, Clone)]
pub struct ReplanSettings {
    /// How many days past today the overflow loop may reach.
    pub max_overflow_attempts: u32,
    /// Timezone the technicians' working-hour strings are written in.
    pub business_timezone: chrono_tz::Tz,
    /// Fixed depot coordinate, always location index 0 in the payload.
    pub depot_location: LatLng,
    /// Nominal departure hour (UTC) used for predictive travel times on
    /// future planning days.
    pub predictive_departure_hour_utc: u32,
}

impl Default for ReplanSettings {
    fn default() -> Self {
        Self {
            max_overflow_attempts: 4,
            business_timezone: chrono_tz::America::Edmonton,
            depot_location: LatLng {
                lat: 51.0447,
                lng: -114.0719,
            },
            predictive_departure_hour_utc: 15,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = ReplanSettings::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            google_maps_api_key: env::var("GOOGLE_MAPS_API_KEY")
                .context("GOOGLE_MAPS_API_KEY must be set")?,
            onestep_gps_api_key: env::var("ONESTEP_GPS_API_KEY").ok(),
            optimizer_url: env::var("OPTIMIZER_URL").context("OPTIMIZER_URL must be set")?,
            bypass_optimizer_auth: env::var("BYPASS_OPTIMIZER_AUTH")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            replan: ReplanSettings {
                max_overflow_attempts: env::var("MAX_OVERFLOW_ATTEMPTS")
                    .ok()
                    .map(|v| v.parse())
                    .transpose()
                    .context("MAX_OVERFLOW_ATTEMPTS must be a valid number")?
                    .unwrap_or(defaults.max_overflow_attempts),
                business_timezone: env::var("BUSINESS_TIMEZONE")
                    .ok()
                    .map(|v| v.parse())
                    .transpose()
                    .map_err(|e| anyhow::anyhow!("BUSINESS_TIMEZONE is not a known zone: {}", e))?
                    .unwrap_or(defaults.business_timezone),
                depot_location: match (env::var("DEPOT_LAT").ok(), env::var("DEPOT_LNG").ok()) {
                    (Some(lat), Some(lng)) => LatLng {
                        lat: lat.parse().context("DEPOT_LAT must be a valid number")?,
                        lng: lng.parse().context("DEPOT_LNG must be a valid number")?,
                    },
                    _ => defaults.depot_location,
                },
                predictive_departure_hour_utc: env::var("PREDICTIVE_DEPARTURE_HOUR_UTC")
                    .ok()
                    .map(|v| v.parse())
                    .transpose()
                    .context("PREDICTIVE_DEPARTURE_HOUR_UTC must be a valid hour")?
                    .unwrap_or(defaults.predictive_departure_hour_utc),
            },
        })
    }
}
