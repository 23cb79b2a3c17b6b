//! Monte Carlo estimation endpoint
//!
//! `POST /piestimation/monte-carlo` takes `{"radius": .., "totalPoints": ..}`
//! and answers with a JSON array holding the single estimate.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::post,
    Router,
};
use pi_kernel::EstimationRequest;

use super::AppState;
use crate::error::ApiError;

/// Build the estimation routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/piestimation/monte-carlo", post(monte_carlo_handler))
}

/// POST /piestimation/monte-carlo - Estimate pi
async fn monte_carlo_handler(
    State(state): State<AppState>,
    payload: Result<Json<EstimationRequest>, JsonRejection>,
) -> Result<Json<Vec<f64>>, ApiError> {
    let Json(request) = payload.inspect_err(|rejection| {
        tracing::warn!(error = %rejection, "Rejected estimation request body");
    })?;

    tracing::info!(
        radius = request.radius,
        total_points = request.total_points,
        "Starting estimation of pi using monte-carlo method"
    );

    let started = Instant::now();
    let result = estimate(&state, request).await;

    let outcome = match &result {
        Ok(_) => "ok",
        Err(err) => err.code(),
    };
    metrics::counter!("pi_estimations_total", "outcome" => outcome).increment(1);
    if result.is_ok() {
        metrics::histogram!("pi_estimation_duration_seconds")
            .record(started.elapsed().as_secs_f64());
    }

    result.map(|estimate| Json(vec![estimate]))
}

/// Validates, enforces the ceiling, and runs the estimator off the async runtime.
async fn estimate(state: &AppState, request: EstimationRequest) -> Result<f64, ApiError> {
    let plan = request.plan()?;

    if let Some(limit) = state.config.max_total_points {
        if plan.total_points() > limit {
            tracing::warn!(
                total_points = plan.total_points(),
                limit,
                "Rejected estimation above totalPoints limit"
            );
            return Err(ApiError::TotalPointsLimit {
                requested: request.total_points,
                limit,
            });
        }
    }

    let estimator = Arc::clone(&state.estimator);
    let estimate = tokio::task::spawn_blocking(move || estimator.estimate_plan(&plan)).await?;

    Ok(estimate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::error::ErrorResponse;
    use crate::routes::test_estimator;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        AppState::new(Arc::new(ServerConfig::default()), test_estimator())
    }

    async fn post(state: AppState, body: &'static str) -> Response {
        routes()
            .with_state(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/piestimation/monte-carlo")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_bytes(response: Response) -> axum::body::Bytes {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_small_data_set_returns_single_estimate() {
        let response = post(
            create_test_state(),
            r#"{"radius": 50.5, "totalPoints": 100}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let values: Vec<f64> = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(values.len(), 1);
        assert!((0.0..=4.0).contains(&values[0]));
    }

    #[tokio::test]
    async fn test_large_data_set_converges() {
        let response = post(
            create_test_state(),
            r#"{"radius": 100.5, "totalPoints": 100000}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let values: Vec<f64> = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!((values[0] - std::f64::consts::PI).abs() < 0.1);
    }

    #[tokio::test]
    async fn test_invalid_radius_returns_400() {
        let response = post(
            create_test_state(),
            r#"{"radius": -1.0, "totalPoints": 10000}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let error: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(error.error, "invalid_radius");
    }

    #[tokio::test]
    async fn test_invalid_total_points_returns_400() {
        let response = post(
            create_test_state(),
            r#"{"radius": 100.0, "totalPoints": -100}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let error: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(error.error, "invalid_total_points");
        assert!(error.message.contains("-100"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_client_error() {
        let response = post(create_test_state(), r#"{"radius": "wide"}"#).await;
        assert!(response.status().is_client_error());

        let error: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(error.error, "invalid_request");
    }

    #[tokio::test]
    async fn test_empty_body_is_invalid_total_points() {
        let response = post(create_test_state(), "{}").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let error: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(error.error, "invalid_total_points");
    }

    #[tokio::test]
    async fn test_ceiling_rejects_large_requests() {
        let config = ServerConfig {
            max_total_points: Some(1_000),
            ..Default::default()
        };
        let state = AppState::new(Arc::new(config), test_estimator());

        let response = post(state.clone(), r#"{"radius": 1.0, "totalPoints": 1001}"#).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let error: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(error.error, "total_points_limit");

        let response = post(state, r#"{"radius": 1.0, "totalPoints": 1000}"#).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_validation_precedes_ceiling() {
        let config = ServerConfig {
            max_total_points: Some(10),
            ..Default::default()
        };
        let state = AppState::new(Arc::new(config), test_estimator());

        let response = post(state, r#"{"radius": 0.0, "totalPoints": 1000}"#).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_estimation_route_is_post_only() {
        let response = routes()
            .with_state(create_test_state())
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/piestimation/monte-carlo")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
