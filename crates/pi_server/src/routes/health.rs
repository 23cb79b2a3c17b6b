//! Health check and monitoring endpoints
//!
//! Provides health and readiness endpoints for load balancer integration
//! and service availability monitoring.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use super::AppState;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Health status ("healthy" or "unhealthy")
    pub status: String,
    /// Server version
    pub version: String,
    /// Server uptime in seconds
    pub uptime_secs: u64,
    /// Start time, RFC 3339
    pub started_at: String,
    /// Estimator status
    pub estimator: EstimatorStatus,
}

/// Estimator status for health check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatorStatus {
    /// Worker threads in the estimation pool
    pub workers: usize,
    /// Samples per batch
    pub batch_size: u64,
    /// Largest accepted totalPoints, if bounded
    pub max_total_points: Option<u64>,
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    /// Ready status
    pub ready: bool,
}

/// Build the health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
}

/// GET /health - Health check endpoint
///
/// Returns the server health status, version, uptime, and estimator settings.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();
    let estimator = state.estimator.config();

    let response = HealthResponse {
        status: "healthy".to_string(),
        version: crate::VERSION.to_string(),
        uptime_secs: uptime,
        started_at: state.started_at.to_rfc3339(),
        estimator: EstimatorStatus {
            workers: estimator.workers(),
            batch_size: estimator.batch_size(),
            max_total_points: state.config.max_total_points,
        },
    };

    (StatusCode::OK, Json(response))
}

/// GET /ready - Readiness probe endpoint
async fn ready_handler() -> impl IntoResponse {
    let response = ReadyResponse { ready: true };
    (StatusCode::OK, Json(response))
}
