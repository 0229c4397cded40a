//! Read-only Postgres access for the report pipeline.
//!
//! Detections are returned in a stable order (`created_at, id`) because matching is
//! order-dependent: the same rows must always pair the same way.

use sqlx::{PgPool, Result};
use uuid::Uuid;

use crate::inspection::models::{Detection, Property};
use crate::models::inspection::{DetectionRow, InspectionRow};
use crate::models::property::PropertyRow;

pub async fn get_property(pool: &PgPool, property_id: Uuid) -> Result<Option<Property>> {
    let row = sqlx::query_as::<_, PropertyRow>("SELECT * FROM properties WHERE id = $1")
        .bind(property_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Property::from))
}

pub async fn get_inspection(pool: &PgPool, inspection_id: Uuid) -> Result<Option<InspectionRow>> {
    Ok(
        sqlx::query_as::<_, InspectionRow>("SELECT * FROM inspections WHERE id = $1")
            .bind(inspection_id)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn get_detections(pool: &PgPool, inspection_id: Uuid) -> Result<Vec<Detection>> {
    let rows = sqlx::query_as::<_, DetectionRow>(
        r#"
        SELECT *
        FROM detections
        WHERE inspection_id = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(inspection_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Detection::from).collect())
}
