//! Route modules for the pi server
//!
//! This module contains endpoint group-specific routers:
//! - estimation: Monte Carlo estimation endpoint
//! - health: Health check and readiness endpoints

pub mod estimation;
pub mod health;

use axum::{extract::Request, http::HeaderValue, Router};
use chrono::{DateTime, Utc};
use pi_kernel::Estimator;
use std::sync::Arc;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::ServerConfig;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Estimator with its worker pool
    pub estimator: Arc<Estimator>,
    /// Server start time for uptime calculation
    pub start_time: std::time::Instant,
    /// Wall-clock start time reported by the health endpoint
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(config: Arc<ServerConfig>, estimator: Arc<Estimator>) -> Self {
        Self {
            config,
            estimator,
            start_time: std::time::Instant::now(),
            started_at: Utc::now(),
        }
    }
}

/// Generates a UUID v4 `x-request-id` for requests that arrive without one
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestUuid;

impl MakeRequestId for RequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = HeaderValue::from_str(&Uuid::new_v4().to_string()).ok()?;
        Some(RequestId::new(id))
    }
}

/// Build the main application router by merging all route modules
pub fn build_router(config: Arc<ServerConfig>, estimator: Arc<Estimator>) -> Router {
    let state = AppState::new(config, estimator);

    Router::new()
        .merge(health::routes())
        .merge(estimation::routes())
        .with_state(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id,
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(RequestUuid))
}

#[cfg(test)]
pub(crate) fn test_estimator() -> Arc<Estimator> {
    let config = pi_kernel::EstimatorConfig::builder()
        .workers(2)
        .batch_size(1_024)
        .build()
        .unwrap();
    Arc::new(Estimator::new(config).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn router() -> Router {
        build_router(Arc::new(ServerConfig::default()), test_estimator())
    }

    #[tokio::test]
    async fn test_build_router_creates_valid_router() {
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_router_merges_all_route_groups() {
        let router = router();

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/piestimation/monte-carlo")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"radius": 1.0, "totalPoints": 10}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_returns_404() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/unknown/path")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_request_id_is_generated() {
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let id = response
            .headers()
            .get("x-request-id")
            .expect("x-request-id header")
            .to_str()
            .unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "caller-supplied")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["x-request-id"], "caller-supplied");
    }

    #[tokio::test]
    async fn test_app_state_uptime() {
        let state = AppState::new(Arc::new(ServerConfig::default()), test_estimator());

        std::thread::sleep(std::time::Duration::from_millis(10));

        let elapsed = state.start_time.elapsed();
        assert!(elapsed.as_millis() >= 10);
        assert!(state.started_at <= Utc::now());
    }

    #[tokio::test]
    async fn test_app_state_config_access() {
        let mut config = ServerConfig::default();
        config.port = 9999;
        let state = AppState::new(Arc::new(config), test_estimator());

        assert_eq!(state.config.port, 9999);
        assert_eq!(state.estimator.config().workers(), 2);
    }
}
