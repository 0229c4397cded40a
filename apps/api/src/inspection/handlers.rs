//! Axum route handlers for inspection comparisons.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::inspection::diff::compare_inspections;
use crate::inspection::models::{Detection, Inspection, InspectionKind, Property, RoomComparison};
use crate::inspection::repository::{get_detections, get_inspection, get_property};
use crate::inspection::summary::{summarize, InspectionSummary};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub entry: Vec<Detection>,
    #[serde(default)]
    pub exit: Vec<Detection>,
}

#[derive(Debug, Deserialize)]
pub struct InspectionPairQuery {
    pub entry_id: Uuid,
    pub exit_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ComparisonResponse {
    pub rooms: Vec<RoomComparison>,
    pub summary: InspectionSummary,
}

impl ComparisonResponse {
    fn from_detections(entry: &[Detection], exit: &[Detection]) -> Self {
        let rooms = compare_inspections(entry, exit);
        let summary = summarize(&rooms);
        Self { rooms, summary }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/inspections/compare
///
/// Compares two ad-hoc detection lists without touching the database.
pub async fn handle_compare(
    Json(request): Json<CompareRequest>,
) -> Result<Json<ComparisonResponse>, AppError> {
    Ok(Json(ComparisonResponse::from_detections(
        &request.entry,
        &request.exit,
    )))
}

/// GET /api/v1/properties/:id/comparison?entry_id=..&exit_id=..
///
/// Dashboard view: the same room comparisons and summary the report is built from.
pub async fn handle_property_comparison(
    State(state): State<AppState>,
    Path(property_id): Path<Uuid>,
    Query(params): Query<InspectionPairQuery>,
) -> Result<Json<ComparisonResponse>, AppError> {
    let (_, entry, exit) =
        load_inspection_pair(&state.db, property_id, params.entry_id, params.exit_id).await?;
    Ok(Json(ComparisonResponse::from_detections(
        &entry.detections,
        &exit.detections,
    )))
}

// ────────────────────────────────────────────────────────────────────────────
// Shared loading
// ────────────────────────────────────────────────────────────────────────────

/// Loads a property and its entry/exit inspections, validating ownership and kinds.
pub async fn load_inspection_pair(
    pool: &PgPool,
    property_id: Uuid,
    entry_id: Uuid,
    exit_id: Uuid,
) -> Result<(Property, Inspection, Inspection), AppError> {
    let property = get_property(pool, property_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Property {property_id} not found")))?;

    let entry = load_inspection(pool, property_id, entry_id, InspectionKind::Entry).await?;
    let exit = load_inspection(pool, property_id, exit_id, InspectionKind::Exit).await?;

    Ok((property, entry, exit))
}

async fn load_inspection(
    pool: &PgPool,
    property_id: Uuid,
    inspection_id: Uuid,
    expected: InspectionKind,
) -> Result<Inspection, AppError> {
    let row = get_inspection(pool, inspection_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Inspection {inspection_id} not found")))?;

    if row.property_id != property_id {
        return Err(AppError::Validation(format!(
            "Inspection {inspection_id} does not belong to property {property_id}"
        )));
    }
    let kind = InspectionKind::parse(&row.kind);
    if kind != Some(expected) {
        return Err(AppError::Validation(format!(
            "Inspection {inspection_id} is a '{}' inspection, expected {:?}",
            row.kind, expected
        )));
    }

    let detections = get_detections(pool, inspection_id).await?;
    Ok(Inspection {
        id: row.id,
        kind: expected,
        performed_at: row.performed_at,
        detections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_compare_handler_returns_rooms_and_summary() {
        let request: CompareRequest = serde_json::from_value(serde_json::json!({
            "entry": [{"item": "Mesa", "condition": "used", "room": "Sala"}],
            "exit": [{"item": "mesa", "condition": "damaged", "room": "Sala"}]
        }))
        .unwrap();

        let Json(response) = handle_compare(Json(request)).await.unwrap();
        assert_eq!(response.rooms.len(), 1);
        assert_eq!(response.summary.changed, 1);
        assert_eq!(response.summary.critical_issues, 1);
    }

    #[tokio::test]
    async fn test_compare_handler_accepts_missing_sides() {
        let request: CompareRequest = serde_json::from_value(serde_json::json!({
            "entry": [{"item": "Mesa", "condition": "used", "room": "Sala"}]
        }))
        .unwrap();

        let Json(response) = handle_compare(Json(request)).await.unwrap();
        assert_eq!(response.summary.missing, 1);
    }
}
