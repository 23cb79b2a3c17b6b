//! Estimator configuration.
//!
//! Use [`EstimatorConfigBuilder`] to construct instances; values are checked
//! at build time.

use crate::error::ConfigError;

/// Default number of samples handled by one batch.
pub const DEFAULT_BATCH_SIZE: u64 = 65_536;

/// Worker pool and batching parameters.
///
/// # Examples
///
/// ```rust
/// use pi_kernel::EstimatorConfig;
///
/// let config = EstimatorConfig::builder()
///     .workers(4)
///     .batch_size(10_000)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.workers(), 4);
/// assert_eq!(config.batch_size(), 10_000);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EstimatorConfig {
    /// Number of threads in the dedicated pool.
    workers: usize,
    /// Samples per batch.
    batch_size: u64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl EstimatorConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> EstimatorConfigBuilder {
        EstimatorConfigBuilder::default()
    }

    /// Returns the number of worker threads.
    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Returns the number of samples per batch.
    #[inline]
    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `workers` or `batch_size` is 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkerCount(self.workers));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }
        Ok(())
    }
}

/// Builder for [`EstimatorConfig`].
///
/// Unset fields fall back to the defaults: one worker per logical CPU and
/// [`DEFAULT_BATCH_SIZE`] samples per batch.
#[derive(Clone, Debug, Default)]
pub struct EstimatorConfigBuilder {
    workers: Option<usize>,
    batch_size: Option<u64>,
}

impl EstimatorConfigBuilder {
    /// Sets the number of worker threads.
    #[inline]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Sets the number of samples per batch.
    #[inline]
    pub fn batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a supplied value is 0.
    pub fn build(self) -> Result<EstimatorConfig, ConfigError> {
        let defaults = EstimatorConfig::default();
        let config = EstimatorConfig {
            workers: self.workers.unwrap_or(defaults.workers),
            batch_size: self.batch_size.unwrap_or(defaults.batch_size),
        };

        config.validate()?;
        Ok(config)
    }
}
