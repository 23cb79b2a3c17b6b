//! API error type and its HTTP mapping.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use pi_kernel::EstimationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: String,
    /// Human-readable description
    pub message: String,
}

/// Errors returned by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request parameters were rejected by the estimator
    #[error(transparent)]
    Estimation(#[from] EstimationError),

    /// The body could not be read as an estimation request
    #[error("Invalid request body: {0}")]
    InvalidRequest(#[from] JsonRejection),

    /// totalPoints exceeds the configured ceiling
    #[error("totalPoints {requested} exceeds the limit of {limit}")]
    TotalPointsLimit { requested: i64, limit: u64 },

    /// The estimation task did not complete
    #[error("Estimation task failed: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Estimation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidRequest(rejection) => rejection.status(),
            ApiError::TotalPointsLimit { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Estimation(err) => err.code(),
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::TotalPointsLimit { .. } => "total_points_limit",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
