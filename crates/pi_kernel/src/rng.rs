//! Uniform point generation over the bounding square.
//!
//! [`PointRng`] wraps a `StdRng` together with a `Uniform<f64>` over the
//! half-open interval `[min, max)`. Double precision is used because integer
//! sampling would bias small intervals. The upper bound is never returned;
//! that bias is negligible at realistic sample counts and is kept on purpose.
//!
//! Every batch owns its own `PointRng`, seeded from OS entropy, so concurrent
//! batches neither contend on a shared generator nor correlate.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::geometry::Point;

/// Generator of points uniformly distributed over `[min, max) × [min, max)`.
pub struct PointRng {
    /// The underlying PRNG instance.
    inner: StdRng,
    /// Sampling range shared by both coordinates.
    range: Uniform<f64>,
}

impl PointRng {
    /// Creates a generator seeded from operating system entropy.
    ///
    /// # Panics
    ///
    /// Panics unless `min < max` and `max - min` is finite. Validated plans
    /// always satisfy this.
    pub fn from_entropy(min: f64, max: f64) -> Self {
        Self {
            inner: StdRng::from_entropy(),
            range: Uniform::new(min, max),
        }
    }

    /// Creates a seeded generator; the same seed yields the same points.
    pub(crate) fn from_seed(seed: u64, min: f64, max: f64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
            range: Uniform::new(min, max),
        }
    }

    /// Draws one coordinate from `[min, max)`.
    #[inline]
    pub fn gen_coordinate(&mut self) -> f64 {
        self.range.sample(&mut self.inner)
    }

    /// Draws a point; `x` and `y` are independent.
    #[inline]
    pub fn gen_point(&mut self) -> Point {
        let x = self.gen_coordinate();
        let y = self.gen_coordinate();
        Point::new(x, y)
    }
}

/// Draws a single point from `[min, max) × [min, max)` with a fresh generator.
///
/// Convenient for one-off draws; the pipeline keeps one [`PointRng`] per batch
/// instead.
pub fn generate_point(min: f64, max: f64) -> Point {
    PointRng::from_entropy(min, max).gen_point()
}
