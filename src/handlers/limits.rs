use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};
use std::sync::Arc;
use crate::error::AppError;
use crate::metrics::{RATE_LIMITED_TOTAL, RATE_LIMIT_STORE_SIZE, REQUEST_TOTAL};
use crate::models::{CheckRequest, PolicyView, ResetRequest};
use crate::policy::RateLimitKey;
use crate::rate_limit::RateLimitOutcome;
use crate::state::AppState;

pub async fn check_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> Result<Json<RateLimitOutcome>, AppError> {
    REQUEST_TOTAL.inc();

    let Json(payload) = payload?;
    let key = RateLimitKey::parse(&payload.key)?;
    let config = payload.resolve(&key, &state.policies)?;

    let result = state.rate_limiter.enforce(&key, config);
    RATE_LIMIT_STORE_SIZE.set(state.rate_limiter.len() as f64);

    match result {
        Ok(outcome) => Ok(Json(outcome)),
        Err(exceeded) => {
            RATE_LIMITED_TOTAL.inc();
            Err(exceeded.into())
        }
    }
}

// called after a successful login to forget failed attempts
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ResetRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    REQUEST_TOTAL.inc();

    let Json(payload) = payload?;
    let key = RateLimitKey::parse(&payload.key)?;
    state.rate_limiter.reset(&key);
    RATE_LIMIT_STORE_SIZE.set(state.rate_limiter.len() as f64);

    Ok(StatusCode::NO_CONTENT)
}

pub async fn policies_handler(State(state): State<Arc<AppState>>) -> Json<Vec<PolicyView>> {
    Json(
        state
            .policies
            .iter()
            .map(|(policy, config)| PolicyView {
                policy,
                namespace: policy.namespace(),
                config,
            })
            .collect(),
    )
}
