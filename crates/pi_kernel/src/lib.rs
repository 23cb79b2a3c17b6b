//! # Pi Kernel
//!
//! Monte Carlo estimation of pi. Points are drawn uniformly from the square
//! `[-r, r) × [-r, r)`; the share that lands inside the circle of radius `r`
//! approaches `π / 4`, so the estimate is `4 × inside / total`.
//!
//! The crate provides:
//! - Input validation ([`validate`], [`EstimationRequest::plan`])
//! - Per-batch uniform point generation ([`PointRng`])
//! - Circle classification ([`Point::is_inside`])
//! - Parallel aggregation on a rayon pool ([`Estimator`])
//!
//! ## Usage Example
//!
//! ```rust
//! use pi_kernel::{estimate_pi, EstimationError};
//!
//! let pi = estimate_pi(1.0, 100_000).unwrap();
//! assert!((0.0..=4.0).contains(&pi));
//!
//! assert_eq!(estimate_pi(-1.0, 10_000), Err(EstimationError::InvalidRadius(-1.0)));
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod estimator;
pub mod geometry;
pub mod request;
pub mod rng;
pub mod source;

pub use config::{EstimatorConfig, EstimatorConfigBuilder, DEFAULT_BATCH_SIZE};
pub use error::{ConfigError, EstimationError, SourceError};
pub use estimator::{estimate_pi, scale_estimate, Estimator};
pub use geometry::Point;
pub use request::{validate, EstimationRequest, SamplingPlan};
pub use rng::{generate_point, PointRng};
pub use source::{FixedPoints, FixedSampler, PointSampler, PointSource, RandomPoints};
