use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;

use crate::domains::jobs::models::{
    Address, Job, JobStatus, JobUpdate, JobUpdateData, OrderSummary, Service, ServiceCategory,
    VehicleInfo,
};

/// Flat job row with address, service, order and vehicle joined in.
#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: i64,
    order_id: i64,
    status: Option<String>,
    duration_minutes: i64,
    priority: i32,
    assigned_technician: Option<i64>,
    fixed_schedule_time: Option<DateTime<Utc>>,
    estimated_sched: Option<DateTime<Utc>>,
    address_id: Option<i64>,
    street_address: Option<String>,
    address_lat: Option<f64>,
    address_lng: Option<f64>,
    service_id: Option<i64>,
    service_name: Option<String>,
    service_category: Option<String>,
    earliest_available_time: Option<DateTime<Utc>>,
    vehicle_year: Option<i32>,
    vehicle_make: Option<String>,
    vehicle_model: Option<String>,
}

const JOB_SELECT: &str = r#"
    SELECT
        j.id,
        j.order_id,
        j.status,
        j.duration_minutes,
        j.priority,
        j.assigned_technician,
        j.fixed_schedule_time,
        j.estimated_sched,
        a.id AS address_id,
        a.street_address,
        a.lat AS address_lat,
        a.lng AS address_lng,
        s.id AS service_id,
        s.name AS service_name,
        s.category AS service_category,
        o.earliest_available_time,
        v.year AS vehicle_year,
        v.make AS vehicle_make,
        v.model AS vehicle_model
    FROM jobs j
    JOIN orders o ON o.id = j.order_id
    LEFT JOIN addresses a ON a.id = o.address_id
    LEFT JOIN services s ON s.id = j.service_id
    LEFT JOIN vehicles v ON v.id = o.vehicle_id
"#;

impl Job {
    /// All jobs the planner considers: status in the relevant set, or no
    /// status at all (never touched by the planner, treated as queued).
    pub async fn find_relevant(pool: &PgPool) -> Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "{} WHERE j.status = ANY($1) OR j.status IS NULL ORDER BY j.id",
            JOB_SELECT
        ))
        .bind(vec![
            JobStatus::Queued.as_str(),
            JobStatus::EnRoute.as_str(),
            JobStatus::InProgress.as_str(),
            JobStatus::FixedTime.as_str(),
        ])
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().filter_map(assemble_job).collect())
    }

    pub async fn find_by_statuses(pool: &PgPool, statuses: &[JobStatus]) -> Result<Vec<Job>> {
        let status_strs: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "{} WHERE j.status = ANY($1) ORDER BY j.id",
            JOB_SELECT
        ))
        .bind(status_strs)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().filter_map(assemble_job).collect())
    }

    /// Apply the run's write-back set. Updates are grouped by identical
    /// payload so each group lands in one statement. The first failed group
    /// aborts with an error naming the affected job ids; groups already
    /// written are not rolled back.
    pub async fn apply_updates(pool: &PgPool, updates: &[JobUpdate]) -> Result<()> {
        let mut groups: HashMap<&JobUpdateData, Vec<i64>> = HashMap::new();
        for u in updates {
            groups.entry(&u.data).or_default().push(u.job_id);
        }

        for (data, job_ids) in groups {
            let result = sqlx::query(
                r#"
                UPDATE jobs SET
                    status = $2,
                    assigned_technician = $3,
                    estimated_sched = $4
                WHERE id = ANY($1)
                "#,
            )
            .bind(&job_ids)
            .bind(data.status.as_str())
            .bind(data.assigned_technician)
            .bind(data.estimated_sched)
            .execute(pool)
            .await;

            match result {
                Ok(done) => {
                    tracing::info!(
                        status = %data.status,
                        jobs = job_ids.len(),
                        rows_affected = done.rows_affected(),
                        "Wrote job update batch"
                    );
                }
                Err(e) => {
                    bail!(
                        "failed to update jobs {:?} to status {}: {}",
                        job_ids,
                        data.status,
                        e
                    );
                }
            }
        }

        Ok(())
    }
}

fn assemble_job(row: JobRow) -> Option<Job> {
    let status = match row.status.as_deref() {
        None => JobStatus::Queued,
        Some(s) => match JobStatus::parse(s) {
            Some(status) => status,
            None => {
                tracing::warn!(job_id = row.id, status = s, "Skipping job with unknown status");
                return None;
            }
        },
    };

    let service = match (row.service_id, row.service_category.as_deref()) {
        (Some(id), Some(cat)) => match ServiceCategory::parse(cat) {
            Some(category) => Some(Service {
                id,
                name: row.service_name.clone(),
                category,
            }),
            None => {
                tracing::warn!(job_id = row.id, category = cat, "Unknown service category");
                None
            }
        },
        _ => None,
    };

    let vehicle = match (row.vehicle_year, row.vehicle_make, row.vehicle_model) {
        (Some(year), Some(make), Some(model)) => Some(VehicleInfo { year, make, model }),
        _ => None,
    };

    Some(Job {
        id: row.id,
        order_id: row.order_id,
        status,
        duration_minutes: row.duration_minutes,
        priority: row.priority,
        assigned_technician: row.assigned_technician,
        fixed_schedule_time: row.fixed_schedule_time,
        estimated_sched: row.estimated_sched,
        address: row.address_id.map(|id| Address {
            id,
            street_address: row.street_address,
            lat: row.address_lat,
            lng: row.address_lng,
        }),
        service,
        order: Some(OrderSummary {
            id: row.order_id,
            earliest_available_time: row.earliest_available_time,
            vehicle,
        }),
    })
}
