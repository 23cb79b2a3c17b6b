//! Parallel estimation pipeline.
//!
//! ```text
//! estimate(request)
//! ├── validate            (gate; no sampling on failure)
//! ├── count_inside        (fan-out: one batch per index slice, own sampler)
//! │   └── sum of batches  (fan-in: u64 reduction, order independent)
//! └── scale_estimate      (after every batch has finished)
//! ```
//!
//! The sample index range `0..total_points` is cut into contiguous batches
//! of `batch_size` samples. Batches are spread across the worker pool; each
//! one creates its own sampler, classifies its points, and returns a partial
//! count. Partial counts are combined by rayon's reduction, so there is no
//! shared counter and the total depends only on the multiset of points.

use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::EstimatorConfig;
use crate::error::{ConfigError, EstimationError, SourceError};
use crate::request::{EstimationRequest, SamplingPlan};
use crate::source::{PointSampler, PointSource, RandomPoints};

/// Monte Carlo estimator of pi.
///
/// Holds a dedicated rayon pool sized to [`EstimatorConfig::workers`]. The
/// estimator itself keeps no per-request state and can be shared across
/// threads.
///
/// # Examples
///
/// ```rust
/// use pi_kernel::{EstimationRequest, Estimator, EstimatorConfig};
///
/// let config = EstimatorConfig::builder().workers(2).build().unwrap();
/// let estimator = Estimator::new(config).unwrap();
///
/// let pi = estimator.estimate(&EstimationRequest::new(1.0, 10_000)).unwrap();
/// assert!((0.0..=4.0).contains(&pi));
/// ```
pub struct Estimator {
    config: EstimatorConfig,
    /// `None` runs on rayon's global pool.
    pool: Option<ThreadPool>,
}

impl Estimator {
    /// Creates an estimator with its own worker pool.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid or the pool
    /// cannot be built.
    pub fn new(config: EstimatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers())
            .thread_name(|index| format!("pi-worker-{}", index))
            .build()?;

        tracing::debug!(
            workers = config.workers(),
            batch_size = config.batch_size(),
            "Estimator worker pool started"
        );

        Ok(Self {
            config,
            pool: Some(pool),
        })
    }

    /// Creates an estimator that runs on rayon's global pool.
    pub fn global() -> Self {
        let config = EstimatorConfig::builder()
            .workers(rayon::current_num_threads())
            .build()
            .unwrap_or_default();

        Self { config, pool: None }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimates pi for `request`.
    ///
    /// Validates first; an invalid request returns its error without any
    /// sampling. Otherwise blocks until all `total_points` samples are
    /// classified and returns `4 * inside / total`, a value in `[0, 4]`.
    pub fn estimate(&self, request: &EstimationRequest) -> Result<f64, EstimationError> {
        let plan = request.plan()?;
        Ok(self.estimate_plan(&plan))
    }

    /// Estimates pi for an already validated plan.
    pub fn estimate_plan(&self, plan: &SamplingPlan) -> f64 {
        let started = Instant::now();

        let inside = self.count_with(&RandomPoints, plan);
        tracing::info!(inside_count = inside, "Total points inside circle: {}", inside);

        let estimate = scale_estimate(inside, plan.total_points());
        tracing::info!(
            estimate,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Estimated value of Pi: {}",
            estimate
        );

        estimate
    }

    /// Counts the points of `source` that fall inside the plan's circle.
    ///
    /// Returns only once every batch has finished.
    ///
    /// # Errors
    ///
    /// [`SourceError::Exhausted`] if the plan needs more samples than
    /// `source` can supply; no sampling happens in that case.
    pub fn count_inside<S: PointSource>(
        &self,
        source: &S,
        plan: &SamplingPlan,
    ) -> Result<u64, SourceError> {
        if let Some(available) = source.capacity() {
            if plan.total_points() > available {
                return Err(SourceError::Exhausted {
                    requested: plan.total_points(),
                    available,
                });
            }
        }
        Ok(self.count_with(source, plan))
    }

    fn count_with<S: PointSource>(&self, source: &S, plan: &SamplingPlan) -> u64 {
        let total = plan.total_points();
        let batch_size = self.config.batch_size();
        let batches = total.div_ceil(batch_size);
        let radius = plan.radius();

        tracing::debug!(total, batch_size, batches, "Dispatching sample batches");

        self.run(|| {
            (0..batches)
                .into_par_iter()
                .map(|batch| {
                    let start = batch * batch_size;
                    let end = start.saturating_add(batch_size).min(total);
                    let mut sampler = source.sampler(plan);

                    (start..end).fold(0u64, |inside, index| {
                        inside + u64::from(sampler.sample(index).is_inside(radius))
                    })
                })
                .sum::<u64>()
        })
    }

    fn run<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

/// Scales an inside count to the estimate `4 * inside / total`.
#[inline]
pub fn scale_estimate(inside: u64, total: u64) -> f64 {
    4.0 * inside as f64 / total as f64
}

/// Estimates pi on rayon's global pool.
///
/// # Errors
///
/// [`EstimationError::InvalidTotalPoints`] if `total_points <= 0`,
/// [`EstimationError::InvalidRadius`] if `radius <= 0` (or not finite).
pub fn estimate_pi(radius: f64, total_points: i64) -> Result<f64, EstimationError> {
    Estimator::global().estimate(&EstimationRequest::new(radius, total_points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::source::FixedPoints;
    use approx::assert_relative_eq;

    fn estimator(workers: usize, batch_size: u64) -> Estimator {
        let config = EstimatorConfig::builder()
            .workers(workers)
            .batch_size(batch_size)
            .build()
            .unwrap();
        Estimator::new(config).unwrap()
    }

    #[test]
    fn test_scale_estimate() {
        assert_eq!(scale_estimate(0, 10), 0.0);
        assert_eq!(scale_estimate(10, 10), 4.0);
        assert_relative_eq!(scale_estimate(785, 1000), 3.14, epsilon = 1e-12);
    }

    #[test]
    fn test_count_inside_fixed_points() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0), // on the boundary
            Point::new(1.0, 1.0),
            Point::new(-0.5, 0.5),
            Point::new(-0.99, -0.99),
        ];
        let plan = EstimationRequest::new(1.0, 5).plan().unwrap();

        let inside = estimator(2, 2)
            .count_inside(&FixedPoints::new(points), &plan)
            .unwrap();
        assert_eq!(inside, 3);
    }

    #[test]
    fn test_count_inside_uses_only_planned_samples() {
        let points = vec![Point::new(0.0, 0.0); 10];
        let plan = EstimationRequest::new(1.0, 4).plan().unwrap();

        let inside = estimator(3, 3)
            .count_inside(&FixedPoints::new(points), &plan)
            .unwrap();
        assert_eq!(inside, 4);
    }

    #[test]
    fn test_count_inside_rejects_short_source() {
        let points = vec![Point::new(0.0, 0.0); 3];
        let plan = EstimationRequest::new(1.0, 4).plan().unwrap();

        let result = estimator(2, 2).count_inside(&FixedPoints::new(points), &plan);
        assert_eq!(
            result,
            Err(SourceError::Exhausted {
                requested: 4,
                available: 3
            })
        );
    }

    #[test]
    fn test_batch_size_larger_than_total() {
        let points = vec![Point::new(0.1, 0.1); 7];
        let plan = EstimationRequest::new(1.0, 7).plan().unwrap();

        let inside = estimator(4, 1_000)
            .count_inside(&FixedPoints::new(points), &plan)
            .unwrap();
        assert_eq!(inside, 7);
    }

    #[test]
    fn test_estimate_rejects_before_sampling() {
        let est = estimator(1, 16);
        assert_eq!(
            est.estimate(&EstimationRequest::new(-1.0, 10_000)),
            Err(EstimationError::InvalidRadius(-1.0))
        );
        assert_eq!(
            est.estimate(&EstimationRequest::new(100.0, -100)),
            Err(EstimationError::InvalidTotalPoints(-100))
        );
    }

    #[test]
    fn test_estimate_in_range() {
        let value = estimator(2, 64)
            .estimate(&EstimationRequest::new(50.5, 100))
            .unwrap();
        assert!((0.0..=4.0).contains(&value));
    }

    #[test]
    fn test_single_sample_is_degenerate() {
        let value = estimator(1, 1)
            .estimate(&EstimationRequest::new(1.0, 1))
            .unwrap();
        assert!(value == 0.0 || value == 4.0);
    }

    #[test]
    fn test_global_estimator() {
        let est = Estimator::global();
        assert!(est.config().workers() >= 1);

        let value = estimate_pi(1.0, 1_000).unwrap();
        assert!((0.0..=4.0).contains(&value));
    }

    #[test]
    fn test_new_with_default_config() {
        let est = Estimator::new(EstimatorConfig::default()).unwrap();
        assert_eq!(est.config().workers(), num_cpus::get());
    }
}
