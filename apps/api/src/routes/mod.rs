pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::extraction::handlers as extraction;
use crate::matching::handlers as matching;
use crate::state::AppState;

/// Upper bound for uploaded CV and task documents.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // CV extraction
        .route(
            "/api/v1/employees/:id/cv",
            post(extraction::handle_upload_cv).get(extraction::handle_cv_status),
        )
        .route("/api/v1/cv/analyze", post(extraction::handle_analyze_cv))
        .route("/api/v1/tasks/analyze", post(extraction::handle_analyze_task))
        // Workload & matching
        .route(
            "/api/v1/employees/:id/workload",
            get(matching::handle_workload),
        )
        .route("/api/v1/tasks/:id/matches", get(matching::handle_task_matches))
        .route(
            "/api/v1/tasks/:id/matches/:employee_id",
            get(matching::handle_task_match),
        )
        .route("/api/v1/matches", post(matching::handle_rank))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
