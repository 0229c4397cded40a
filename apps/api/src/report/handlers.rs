//! Axum route handlers for report export.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::inspection::handlers::load_inspection_pair;
use crate::inspection::summary::InspectionSummary;
use crate::report::assembler::assemble_report;
use crate::report::content::SectionConfig;
use crate::state::AppState;
use crate::storage::{report_key, upload_report};

#[derive(Debug, Deserialize)]
pub struct GenerateReportRequest {
    pub property_id: Uuid,
    pub entry_inspection_id: Uuid,
    pub exit_inspection_id: Uuid,
    #[serde(default)]
    pub sections: SectionConfig,
}

#[derive(Debug, Serialize)]
pub struct GenerateReportResponse {
    pub report_id: Uuid,
    pub s3_key: String,
    pub page_count: usize,
    pub breaks: Vec<f64>,
    pub summary: InspectionSummary,
}

/// POST /api/v1/reports
///
/// Full export pipeline: load → diff → render → paginate → PDF → S3.
/// Nothing is uploaded unless the whole document was produced.
pub async fn handle_generate_report(
    State(state): State<AppState>,
    Json(request): Json<GenerateReportRequest>,
) -> Result<Json<GenerateReportResponse>, AppError> {
    if request.entry_inspection_id == request.exit_inspection_id {
        return Err(AppError::Validation(
            "entry and exit inspections must differ".to_string(),
        ));
    }

    let (property, entry, exit) = load_inspection_pair(
        &state.db,
        request.property_id,
        request.entry_inspection_id,
        request.exit_inspection_id,
    )
    .await?;

    let document = assemble_report(
        state.renderer.as_ref(),
        state.writer.as_ref(),
        &state.config.page,
        &property,
        &entry,
        &exit,
        &request.sections,
    )
    .await?;

    let report_id = Uuid::new_v4();
    let s3_key = report_key(property.id, report_id);
    upload_report(&state.s3, &state.config.s3_bucket, &s3_key, document.document)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    Ok(Json(GenerateReportResponse {
        report_id,
        s3_key,
        page_count: document.page_count,
        breaks: document.breaks,
        summary: document.summary,
    }))
}
