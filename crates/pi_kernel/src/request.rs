//! Estimation requests and the validation gate.
//!
//! A request only reaches the sampling pipeline as a [`SamplingPlan`], and
//! the only way to obtain a plan is [`EstimationRequest::plan`], which runs
//! [`validate`] first.

use serde::{Deserialize, Serialize};

use crate::error::EstimationError;

/// Parameters of a single estimation run.
///
/// `total_points` is signed so that a negative value from the wire reaches
/// [`validate`] and is reported as [`EstimationError::InvalidTotalPoints`].
/// Missing fields deserialise as zero and are rejected the same way.
///
/// # Examples
///
/// ```rust
/// use pi_kernel::EstimationRequest;
///
/// let request = EstimationRequest::new(50.5, 100);
/// let plan = request.plan().unwrap();
/// assert_eq!(plan.total_points(), 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EstimationRequest {
    /// Radius of the circle; points are drawn from `[-radius, radius)`.
    pub radius: f64,
    /// Number of points to sample.
    pub total_points: i64,
}

impl EstimationRequest {
    /// Creates a request. No validation happens here.
    pub fn new(radius: f64, total_points: i64) -> Self {
        Self {
            radius,
            total_points,
        }
    }

    /// Validates the request.
    pub fn validate(&self) -> Result<(), EstimationError> {
        validate(self.total_points, self.radius)
    }

    /// Validates the request and converts it into a [`SamplingPlan`].
    pub fn plan(&self) -> Result<SamplingPlan, EstimationError> {
        self.validate()?;
        Ok(SamplingPlan {
            radius: self.radius,
            total_points: self.total_points as u64,
        })
    }
}

/// Checks that `total_points` and `radius` can produce an estimate.
///
/// `total_points` is checked before `radius`. A warning naming the offending
/// value is logged before the error is returned.
///
/// Besides non-positive values, a radius that is NaN, infinite, or large
/// enough that the sampling width `2 * radius` overflows is rejected as
/// [`EstimationError::InvalidRadius`].
pub fn validate(total_points: i64, radius: f64) -> Result<(), EstimationError> {
    if total_points <= 0 {
        tracing::warn!(
            total_points,
            "Invalid totalPoints: {}. Pi estimation may not be accurate.",
            total_points
        );
        return Err(EstimationError::InvalidTotalPoints(total_points));
    }

    // `!(radius > 0.0)` also catches NaN.
    if !(radius > 0.0) || !(2.0 * radius).is_finite() {
        tracing::warn!(
            radius,
            "Invalid radius: {}. Pi estimation may not be accurate.",
            radius
        );
        return Err(EstimationError::InvalidRadius(radius));
    }

    Ok(())
}

/// A validated request, ready for sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingPlan {
    radius: f64,
    total_points: u64,
}

impl SamplingPlan {
    /// Radius of the circle.
    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Number of points to sample (always at least 1).
    #[inline]
    pub fn total_points(&self) -> u64 {
        self.total_points
    }

    /// Lower bound of the sampling interval (inclusive).
    #[inline]
    pub fn min(&self) -> f64 {
        -self.radius
    }

    /// Upper bound of the sampling interval (exclusive).
    #[inline]
    pub fn max(&self) -> f64 {
        self.radius
    }
}
