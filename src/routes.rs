use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use crate::handlers::{
    check_handler, health_handler, heartbeat_handler, metrics_handler, policies_handler,
    reset_handler, viewers_handler,
};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/rate-limit/check", post(check_handler))
        .route("/api/rate-limit/reset", post(reset_handler))
        .route("/api/rate-limit/policies", get(policies_handler))
        .route("/api/streams/{stream_id}/heartbeat", post(heartbeat_handler))
        .route("/api/streams/{stream_id}/viewers", get(viewers_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::policy::{Policy, PolicyTable, RateLimitConfig};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use std::time::Duration;
    use tower::ServiceExt;

    const START: u64 = 1_700_000_000_000;

    fn app() -> (Arc<ManualClock>, Arc<AppState>, Router) {
        let clock = Arc::new(ManualClock::new(START));
        let mut policies = PolicyTable::default();
        policies.set(Policy::Heartbeat, RateLimitConfig::new(2, 60_000).unwrap());
        let state = Arc::new(AppState::new(
            clock.clone(),
            policies,
            Duration::from_secs(5),
            Duration::from_secs(45),
        ));
        (clock, state.clone(), router(state))
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Option<String>, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Option<String>, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        send(app, request).await
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, retry_after, body)
    }

    #[tokio::test]
    async fn test_login_policy_blocks_eleventh_attempt() {
        let (_clock, _state, app) = app();
        let body = json!({"key": "login:a@x.com", "policy": "login"});

        let (status, _, first) = post_json(&app, "/api/rate-limit/check", body.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["success"], true);
        assert_eq!(first["resetTime"], START + 900_000);

        for _ in 1..10 {
            let (status, _, _) = post_json(&app, "/api/rate-limit/check", body.clone()).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, retry_after, denied) =
            post_json(&app, "/api/rate-limit/check", body).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(retry_after.as_deref(), Some("900"));
        assert_eq!(denied["success"], false);
        assert_eq!(denied["resetTime"], first["resetTime"]);
        assert_eq!(denied["retryAfter"], 900);
    }

    #[tokio::test]
    async fn test_ad_hoc_limit_and_window_expiry() {
        let (clock, _state, app) = app();
        let body = json!({"key": "admin:7", "maxAttempts": 1, "windowMs": 2_000});

        let (status, _, _) = post_json(&app, "/api/rate-limit/check", body.clone()).await;
        assert_eq!(status, StatusCode::OK);

        clock.advance(Duration::from_millis(500));
        let (status, retry_after, _) =
            post_json(&app, "/api/rate-limit/check", body.clone()).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(retry_after.as_deref(), Some("2"));

        clock.advance(Duration::from_millis(1_500));
        let (status, _, again) = post_json(&app, "/api/rate-limit/check", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(again["resetTime"], START + 4_000);
    }

    #[tokio::test]
    async fn test_reset_clears_failed_attempts() {
        let (_clock, state, app) = app();
        let body = json!({"key": "login:b@x.com", "maxAttempts": 1, "windowMs": 60_000});

        post_json(&app, "/api/rate-limit/check", body.clone()).await;
        let (status, _, _) = post_json(&app, "/api/rate-limit/check", body.clone()).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        let (status, _, _) =
            post_json(&app, "/api/rate-limit/reset", json!({"key": "login:b@x.com"})).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.rate_limiter.is_empty());

        let (status, _, _) = post_json(&app, "/api/rate-limit/check", body).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_input_is_bad_request() {
        let (_clock, state, app) = app();

        let (status, _, body) = post_json(
            &app,
            "/api/rate-limit/check",
            json!({"key": "no-namespace", "policy": "login"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _, _) = post_json(
            &app,
            "/api/rate-limit/check",
            json!({"key": "admin:1", "maxAttempts": 0, "windowMs": 1_000}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(state.rate_limiter.is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_bodies_get_json_400() {
        let (_clock, state, app) = app();

        let bodies = [
            json!({"key": "login:a@x.com", "policy": "choir"}),
            json!({"key": "admin:1", "maxAttempts": -1, "windowMs": 1_000}),
            json!({"key": "admin:1", "policy": "login"}),
            json!({"key": "login:a@x.com", "policy": "login", "maxAttempts": 3}),
            json!({"policy": "login"}),
        ];
        for body in bodies {
            let (status, _, resp) = post_json(&app, "/api/rate-limit/check", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(resp["success"], false);
            assert!(resp["error"].is_string());
        }
        assert!(state.rate_limiter.is_empty());

        let (status, _, resp) =
            post_json(&app, "/api/streams/sunday/heartbeat", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["success"], false);

        let (status, _, resp) = post_json(&app, "/api/rate-limit/reset", json!({"id": 1})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["success"], false);
    }

    #[tokio::test]
    async fn test_policies_listing() {
        let (_clock, _state, app) = app();
        let (status, _, body) = get_json(&app, "/api/rate-limit/policies").await;
        assert_eq!(status, StatusCode::OK);

        let policies = body.as_array().unwrap();
        assert_eq!(policies.len(), Policy::ALL.len());
        let login = policies.iter().find(|p| p["policy"] == "login").unwrap();
        assert_eq!(login["maxAttempts"], 10);
        assert_eq!(login["windowMs"], 900_000);
    }

    #[tokio::test]
    async fn test_heartbeat_counts_and_limits_viewers() {
        let (_clock, _state, app) = app();
        let uri = "/api/streams/sunday/heartbeat";

        let (status, _, body) = post_json(&app, uri, json!({"viewerId": "v1"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["activeViewers"], 1);

        let (_, _, body) = post_json(&app, uri, json!({"viewerId": "v2"})).await;
        assert_eq!(body["activeViewers"], 2);
        assert_eq!(body["streamId"], "sunday");

        post_json(&app, uri, json!({"viewerId": "v1"})).await;
        let (status, retry_after, _) = post_json(&app, uri, json!({"viewerId": "v1"})).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(retry_after.as_deref(), Some("60"));
    }

    #[tokio::test]
    async fn test_viewer_count_is_cached_until_heartbeat() {
        let (clock, _state, app) = app();

        post_json(&app, "/api/streams/sunday/heartbeat", json!({"viewerId": "v1"})).await;

        let (_, _, first) = get_json(&app, "/api/streams/sunday/viewers").await;
        assert_eq!(first["activeViewers"], 1);
        assert_eq!(first["cached"], false);

        let (_, _, second) = get_json(&app, "/api/streams/sunday/viewers").await;
        assert_eq!(second["cached"], true);

        post_json(&app, "/api/streams/sunday/heartbeat", json!({"viewerId": "v2"})).await;
        let (_, _, third) = get_json(&app, "/api/streams/sunday/viewers").await;
        assert_eq!(third["activeViewers"], 2);
        assert_eq!(third["cached"], false);

        clock.advance(Duration::from_secs(5));
        let (_, _, fourth) = get_json(&app, "/api/streams/sunday/viewers").await;
        assert_eq!(fourth["cached"], false);
    }

    #[tokio::test]
    async fn test_health_reports_store_size() {
        let (_clock, _state, app) = app();

        post_json(
            &app,
            "/api/rate-limit/check",
            json!({"key": "register:10.0.0.1", "policy": "register"}),
        )
        .await;
        post_json(&app, "/api/streams/sunday/heartbeat", json!({"viewerId": "v1"})).await;

        let (status, _, body) = get_json(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        // register key plus the heartbeat key
        assert_eq!(body["rateLimitStoreSize"], 2);
        assert_eq!(body["viewerSessions"], 1);
    }

    #[tokio::test]
    async fn test_metrics_exposed() {
        let (_clock, _state, app) = app();
        let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
