pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::inspection::handlers as inspection;
use crate::layout::handlers as layout;
use crate::report::handlers as report;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Comparison API
        .route(
            "/api/v1/inspections/compare",
            post(inspection::handle_compare),
        )
        .route(
            "/api/v1/properties/:id/comparison",
            get(inspection::handle_property_comparison),
        )
        // Pagination API
        .route("/api/v1/layout/breaks", post(layout::handle_plan_breaks))
        // Report export
        .route("/api/v1/reports", post(report::handle_generate_report))
        .with_state(state)
}
