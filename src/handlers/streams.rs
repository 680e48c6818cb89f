use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use std::sync::Arc;
use crate::error::AppError;
use crate::metrics::{RATE_LIMITED_TOTAL, REQUEST_TOTAL, VIEWER_SESSIONS};
use crate::models::{HeartbeatRequest, ViewerCount};
use crate::policy::Policy;
use crate::state::AppState;

pub async fn heartbeat_handler(
    State(state): State<Arc<AppState>>,
    Path(stream_id): Path<String>,
    payload: Result<Json<HeartbeatRequest>, JsonRejection>,
) -> Result<Json<ViewerCount>, AppError> {
    REQUEST_TOTAL.inc();

    let Json(payload) = payload?;
    let key = Policy::Heartbeat.key(&payload.viewer_id)?;
    if let Err(exceeded) = state
        .rate_limiter
        .enforce(&key, state.policies.get(Policy::Heartbeat))
    {
        RATE_LIMITED_TOTAL.inc();
        return Err(exceeded.into());
    }

    let active_viewers = state.viewers.heartbeat(&stream_id, payload.viewer_id.trim());
    state.viewer_counts.invalidate(&stream_id);
    VIEWER_SESSIONS.set(state.viewers.session_count() as f64);

    Ok(Json(ViewerCount {
        stream_id,
        active_viewers,
        cached: None,
    }))
}

pub async fn viewers_handler(
    State(state): State<Arc<AppState>>,
    Path(stream_id): Path<String>,
) -> Json<ViewerCount> {
    REQUEST_TOTAL.inc();

    if let Some(active_viewers) = state.viewer_counts.get(&stream_id) {
        return Json(ViewerCount {
            stream_id,
            active_viewers,
            cached: Some(true),
        });
    }

    let active_viewers = state.viewers.active_count(&stream_id);
    state.viewer_counts.insert(stream_id.clone(), active_viewers);

    Json(ViewerCount {
        stream_id,
        active_viewers,
        cached: Some(false),
    })
}
