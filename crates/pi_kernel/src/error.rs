//! Error types for the estimation kernel.
//!
//! [`EstimationError`] is the per-request taxonomy: a request either has a
//! bad radius or a bad point count, and both are rejected before any sampling
//! starts. [`ConfigError`] covers the one-off construction of an
//! [`Estimator`](crate::Estimator) and never surfaces per request.
//! [`SourceError`] only arises when counting over an injected point source.

use thiserror::Error;

/// Rejection of an estimation request.
///
/// Both variants are deterministic input errors; retrying the same request
/// yields the same error.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum EstimationError {
    /// Radius is zero, negative, or not a usable finite value.
    #[error("Invalid radius: {0}. Radius must be a positive finite number")]
    InvalidRadius(f64),

    /// Point count is zero or negative.
    #[error("Invalid totalPoints: {0}. totalPoints must be a positive integer")]
    InvalidTotalPoints(i64),
}

impl EstimationError {
    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            EstimationError::InvalidRadius(_) => "invalid_radius",
            EstimationError::InvalidTotalPoints(_) => "invalid_total_points",
        }
    }
}

/// Estimator configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Worker count of zero.
    #[error("Invalid worker count: {0}. Must be at least 1")]
    InvalidWorkerCount(usize),

    /// Batch size of zero.
    #[error("Invalid batch size: {0}. Must be at least 1")]
    InvalidBatchSize(u64),

    /// The dedicated thread pool could not be created.
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A point source cannot cover the requested number of samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The plan asks for more samples than the source holds.
    #[error("Point source exhausted: {requested} samples requested, {available} available")]
    Exhausted {
        /// Samples the plan needs.
        requested: u64,
        /// Samples the source can supply.
        available: u64,
    },
}
