use anyhow::Result;
use sqlx::PgPool;
use std::collections::HashMap;

use crate::domains::equipment::models::VanEquipment;
use crate::domains::jobs::models::Job;

impl VanEquipment {
    /// Batch-load inventories for a set of vans, grouped by van id.
    pub async fn find_for_vans(
        pool: &PgPool,
        van_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<VanEquipment>>> {
        let rows = sqlx::query_as::<_, VanEquipment>(
            r#"
            SELECT ve.van_id, e.id AS equipment_id, e.model
            FROM van_equipment ve
            JOIN equipment e ON e.id = ve.equipment_id
            WHERE ve.van_id = ANY($1)
            ORDER BY ve.van_id, e.model
            "#,
        )
        .bind(van_ids)
        .fetch_all(pool)
        .await?;

        let mut by_van: HashMap<i64, Vec<VanEquipment>> = HashMap::new();
        for row in rows {
            by_van.entry(row.van_id).or_default().push(row);
        }
        Ok(by_van)
    }
}

/// Resolve the order's vehicle to a ymm id through the reference table.
/// Make/model matching is case-insensitive.
pub async fn ymm_id_for_order(pool: &PgPool, order_id: i64) -> Result<Option<i64>> {
    let ymm_id = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT y.ymm_id
        FROM orders o
        JOIN vehicles v ON v.id = o.vehicle_id
        JOIN ymm_references y
            ON y.year = v.year
            AND LOWER(y.make) = LOWER(v.make)
            AND LOWER(y.model) = LOWER(v.model)
        WHERE o.id = $1
        "#,
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;

    Ok(ymm_id)
}

/// Equipment models a job requires.
///
/// Looks up the unified (ymm_id, service_id) requirement table. When that
/// has no rows, falls back to a generic requirement: an equipment model
/// literally named after the service category, if one exists. Jobs with no
/// service or unresolvable vehicle require nothing.
pub async fn required_models_for_job(pool: &PgPool, job: &Job) -> Result<Vec<String>> {
    let Some(service) = &job.service else {
        return Ok(vec![]);
    };

    let Some(ymm_id) = ymm_id_for_order(pool, job.order_id).await? else {
        return Ok(vec![]);
    };

    let models = sqlx::query_scalar::<_, String>(
        r#"
        SELECT equipment_model
        FROM equipment_requirements
        WHERE ymm_id = $1 AND service_id = $2
        ORDER BY equipment_model
        "#,
    )
    .bind(ymm_id)
    .bind(service.id)
    .fetch_all(pool)
    .await?;

    if !models.is_empty() {
        return Ok(models);
    }

    // Generic-category fallback: require the category-named model when the
    // fleet actually carries one.
    let generic = sqlx::query_scalar::<_, String>(
        "SELECT model FROM equipment WHERE LOWER(model) = LOWER($1) LIMIT 1",
    )
    .bind(service.category.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(generic.into_iter().collect())
}
