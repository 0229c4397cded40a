//! Axum route handler exposing the page break planner directly.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::layout::page_break::{exceeds_page_limit, plan_breaks, ProtectedBlock, MAX_PAGES};

#[derive(Debug, Deserialize)]
pub struct PlanBreaksRequest {
    pub content_height: f64,
    pub max_page_height: f64,
    #[serde(default)]
    pub blocks: Vec<ProtectedBlock>,
}

#[derive(Debug, Serialize)]
pub struct PlanBreaksResponse {
    pub breaks: Vec<f64>,
    pub page_count: usize,
}

/// POST /api/v1/layout/breaks
pub async fn handle_plan_breaks(
    Json(request): Json<PlanBreaksRequest>,
) -> Result<Json<PlanBreaksResponse>, AppError> {
    if !request.content_height.is_finite() || !request.max_page_height.is_finite() {
        return Err(AppError::Validation(
            "content_height and max_page_height must be finite numbers".to_string(),
        ));
    }

    if exceeds_page_limit(request.content_height, request.max_page_height) {
        return Err(AppError::Validation(format!(
            "content would span more than {MAX_PAGES} pages"
        )));
    }

    let breaks = plan_breaks(
        request.content_height,
        request.max_page_height,
        &request.blocks,
    );
    let page_count = breaks.len().saturating_sub(1);
    Ok(Json(PlanBreaksResponse { breaks, page_count }))
}
