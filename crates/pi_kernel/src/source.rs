//! Point sources feeding the aggregation pipeline.
//!
//! A [`PointSource`] hands out one [`PointSampler`] per batch. Samplers are
//! owned by the worker running the batch and never shared, which is what
//! keeps the random source free of contention.
//!
//! - [`RandomPoints`]: production source, one entropy-seeded generator per batch
//! - [`FixedPoints`]: a pre-generated point set, addressed by sample index

use std::sync::Arc;

use crate::geometry::Point;
use crate::request::SamplingPlan;
use crate::rng::PointRng;

/// Per-batch point producer.
pub trait PointSampler {
    /// Returns the point for sample `index`.
    ///
    /// Indices handed to one sampler are contiguous and increasing.
    fn sample(&mut self, index: u64) -> Point;
}

/// Factory for per-batch samplers.
pub trait PointSource: Sync {
    /// Sampler type owned by one batch.
    type Sampler: PointSampler;

    /// Number of samples this source can supply; `None` when unbounded.
    fn capacity(&self) -> Option<u64> {
        None
    }

    /// Creates the sampler for a new batch of `plan`.
    fn sampler(&self, plan: &SamplingPlan) -> Self::Sampler;
}

/// Uniform random points over the plan's bounding square.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPoints;

impl PointSampler for PointRng {
    #[inline]
    fn sample(&mut self, _index: u64) -> Point {
        self.gen_point()
    }
}

impl PointSource for RandomPoints {
    type Sampler = PointRng;

    fn sampler(&self, plan: &SamplingPlan) -> PointRng {
        PointRng::from_entropy(plan.min(), plan.max())
    }
}

/// A fixed, pre-generated set of points.
///
/// Sample `i` is the `i`-th point. A plan asking for more than
/// [`len`](Self::len) samples is refused by
/// [`Estimator::count_inside`](crate::Estimator::count_inside).
#[derive(Debug, Clone)]
pub struct FixedPoints {
    points: Arc<[Point]>,
}

impl FixedPoints {
    /// Wraps the given points.
    pub fn new(points: impl Into<Arc<[Point]>>) -> Self {
        Self {
            points: points.into(),
        }
    }

    /// Number of points held.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if no points are held.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Sampler over a [`FixedPoints`] set.
#[derive(Debug, Clone)]
pub struct FixedSampler {
    points: Arc<[Point]>,
}

impl PointSampler for FixedSampler {
    #[inline]
    fn sample(&mut self, index: u64) -> Point {
        self.points[index as usize]
    }
}

impl PointSource for FixedPoints {
    type Sampler = FixedSampler;

    fn capacity(&self) -> Option<u64> {
        Some(self.points.len() as u64)
    }

    fn sampler(&self, _plan: &SamplingPlan) -> FixedSampler {
        FixedSampler {
            points: Arc::clone(&self.points),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::EstimationRequest;

    #[test]
    fn test_fixed_sampler_returns_points_by_index() {
        let source = FixedPoints::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 2.0)]);
        let plan = EstimationRequest::new(1.0, 2).plan().unwrap();
        let mut sampler = source.sampler(&plan);

        assert_eq!(sampler.sample(1), Point::new(1.0, 2.0));
        assert_eq!(sampler.sample(0), Point::new(0.0, 0.0));
        assert_eq!(source.len(), 2);
        assert!(!source.is_empty());
        assert_eq!(source.capacity(), Some(2));
    }

    #[test]
    fn test_random_points_unbounded() {
        assert_eq!(RandomPoints.capacity(), None);
    }

    #[test]
    fn test_random_sampler_uses_plan_bounds() {
        let plan = EstimationRequest::new(0.25, 1000).plan().unwrap();
        let mut sampler = RandomPoints.sampler(&plan);

        for i in 0..1000 {
            let p = sampler.sample(i);
            assert!(p.x >= -0.25 && p.x < 0.25);
            assert!(p.y >= -0.25 && p.y < 0.25);
        }
    }
}
