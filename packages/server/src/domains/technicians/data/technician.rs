use anyhow::Result;
use chrono::NaiveDate;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::common::geo::LatLng;
use crate::domains::technicians::models::{
    AvailabilityException, DefaultHours, ExceptionKind, Technician, Van,
};

/// Flat technician row with the van and home address joined in.
#[derive(Debug, sqlx::FromRow)]
struct TechnicianRow {
    id: i64,
    user_id: Uuid,
    name: String,
    van_id: Option<i64>,
    van_name: Option<String>,
    device_id: Option<String>,
    van_lat: Option<f64>,
    van_lng: Option<f64>,
    home_lat: Option<f64>,
    home_lng: Option<f64>,
}

#[derive(Debug, sqlx::FromRow)]
struct HoursRow {
    technician_id: i64,
    day_of_week: i32,
    start_time: String,
    end_time: String,
    is_available: Option<bool>,
}

#[derive(Debug, sqlx::FromRow)]
struct ExceptionRow {
    technician_id: i64,
    date: NaiveDate,
    exception_type: String,
    is_available: bool,
    start_time: Option<String>,
    end_time: Option<String>,
}

impl Technician {
    /// Load all active technicians with van, home address, default weekly
    /// hours and availability exceptions. Hours and exceptions are
    /// batch-loaded by technician id and grouped in memory.
    pub async fn find_active(pool: &PgPool) -> Result<Vec<Technician>> {
        let rows = sqlx::query_as::<_, TechnicianRow>(
            r#"
            SELECT
                t.id,
                t.user_id,
                u.name,
                v.id AS van_id,
                v.name AS van_name,
                v.device_id,
                v.lat AS van_lat,
                v.lng AS van_lng,
                h.lat AS home_lat,
                h.lng AS home_lng
            FROM technicians t
            JOIN users u ON u.id = t.user_id
            LEFT JOIN vans v ON v.id = t.assigned_van_id
            LEFT JOIN addresses h ON h.id = t.home_address_id
            WHERE t.is_active
            ORDER BY t.id
            "#,
        )
        .fetch_all(pool)
        .await?;

        let tech_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let hours = sqlx::query_as::<_, HoursRow>(
            r#"
            SELECT technician_id, day_of_week, start_time, end_time, is_available
            FROM technician_default_hours
            WHERE technician_id = ANY($1)
            ORDER BY technician_id, day_of_week, start_time
            "#,
        )
        .bind(&tech_ids)
        .fetch_all(pool)
        .await?;

        let exceptions = sqlx::query_as::<_, ExceptionRow>(
            r#"
            SELECT technician_id, date, exception_type, is_available, start_time, end_time
            FROM technician_availability_exceptions
            WHERE technician_id = ANY($1)
            ORDER BY technician_id, date
            "#,
        )
        .bind(&tech_ids)
        .fetch_all(pool)
        .await?;

        let mut hours_by_tech: HashMap<i64, Vec<DefaultHours>> = HashMap::new();
        for h in hours {
            hours_by_tech
                .entry(h.technician_id)
                .or_default()
                .push(DefaultHours {
                    day_of_week: h.day_of_week,
                    start_time: h.start_time,
                    end_time: h.end_time,
                    // Absent flag means available; only an explicit false opts out.
                    is_available: h.is_available.unwrap_or(true),
                });
        }

        let mut exceptions_by_tech: HashMap<i64, Vec<AvailabilityException>> = HashMap::new();
        for e in exceptions {
            let Some(kind) = ExceptionKind::parse(&e.exception_type) else {
                tracing::warn!(
                    technician_id = e.technician_id,
                    exception_type = %e.exception_type,
                    "Skipping exception with unknown type"
                );
                continue;
            };
            exceptions_by_tech
                .entry(e.technician_id)
                .or_default()
                .push(AvailabilityException {
                    date: e.date,
                    kind,
                    is_available: e.is_available,
                    start_time: e.start_time,
                    end_time: e.end_time,
                });
        }

        let technicians = rows
            .into_iter()
            .map(|r| {
                let van = r.van_id.map(|van_id| Van {
                    id: van_id,
                    name: r.van_name.clone(),
                    device_id: r.device_id.clone(),
                    location: match (r.van_lat, r.van_lng) {
                        (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)),
                        _ => None,
                    },
                });
                let current_location = van.as_ref().and_then(|v| v.location);
                Technician {
                    id: r.id,
                    user_id: r.user_id,
                    name: r.name,
                    home_location: match (r.home_lat, r.home_lng) {
                        (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)),
                        _ => None,
                    },
                    current_location,
                    assigned_van: van,
                    default_hours: hours_by_tech.remove(&r.id).unwrap_or_default(),
                    exceptions: exceptions_by_tech.remove(&r.id).unwrap_or_default(),
                }
            })
            .collect();

        Ok(technicians)
    }
}
