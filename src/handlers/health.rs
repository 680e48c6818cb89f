use axum::{Json, extract::State};
use std::sync::Arc;
use crate::metrics::{RATE_LIMIT_STORE_SIZE, VIEWER_SESSIONS};
use crate::models::HealthReport;
use crate::state::AppState;

// health handler
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    let rate_limit_store_size = state.rate_limiter.len();
    let viewer_sessions = state.viewers.session_count();

    RATE_LIMIT_STORE_SIZE.set(rate_limit_store_size as f64);
    VIEWER_SESSIONS.set(viewer_sessions as f64);

    Json(HealthReport {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
        rate_limit_store_size,
        viewer_sessions,
        cache_size: state.viewer_counts.len(),
    })
}
