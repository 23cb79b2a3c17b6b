//! Server configuration management
//!
//! Handles loading configuration from environment variables, TOML files, and CLI arguments.

use pi_kernel::{EstimatorConfig, DEFAULT_BATCH_SIZE};
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Environment variable names, in one place so `--help` and the loader agree.
pub mod env {
    pub const HOST: &str = "PI_SERVER_HOST";
    pub const PORT: &str = "PI_SERVER_PORT";
    pub const LOG_LEVEL: &str = "PI_LOG_LEVEL";
    pub const LOG_FORMAT: &str = "PI_LOG_FORMAT";
    pub const ENVIRONMENT: &str = "PI_ENV";
    pub const WORKERS: &str = "PI_WORKERS";
    pub const BATCH_SIZE: &str = "PI_BATCH_SIZE";
    pub const MAX_TOTAL_POINTS: &str = "PI_MAX_TOTAL_POINTS";
    pub const SHUTDOWN_TIMEOUT_SECS: &str = "PI_SHUTDOWN_TIMEOUT_SECS";
    pub const METRICS_PORT: &str = "PI_METRICS_PORT";
}

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid port number: {0}. Must be between 1 and 65535")]
    InvalidPort(u16),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: pretty, json")]
    InvalidLogFormat(String),

    #[error("Invalid environment: {0}. Must be one of: development, staging, production")]
    InvalidEnvironment(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Configuration file error: {0}")]
    FileError(String),

    #[error("Environment variable error: {0}")]
    EnvError(String),
}

/// Log levels supported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, coloured output
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidLogFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Server configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Log level
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    /// Log output format
    #[serde(deserialize_with = "deserialize_log_format")]
    pub log_format: LogFormat,
    /// Environment (development, staging, production)
    #[serde(deserialize_with = "deserialize_environment")]
    pub environment: Environment,
    /// Estimation worker threads; 0 uses one per logical CPU
    pub workers: usize,
    /// Samples handled by one batch
    pub batch_size: u64,
    /// Largest accepted totalPoints; unbounded when unset
    pub max_total_points: Option<u64>,
    /// Shutdown timeout in seconds
    pub shutdown_timeout_secs: u64,
    /// Port of the Prometheus exporter; disabled when unset
    pub metrics_port: Option<u16>,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

fn deserialize_log_format<'de, D>(deserializer: D) -> Result<LogFormat, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogFormat::from_str(&s).map_err(serde::de::Error::custom)
}

fn deserialize_environment<'de, D>(deserializer: D) -> Result<Environment, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Environment::from_str(&s).map_err(serde::de::Error::custom)
}

fn parse_var<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvError(format!("{}={} is not a valid value", name, value)))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: LogLevel::Info,
            log_format: LogFormat::Pretty,
            environment: Environment::Development,
            workers: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            max_total_points: None,
            shutdown_timeout_secs: 30,
            metrics_port: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("Failed to read config file: {}", e)))?;

        let config: ServerConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Override fields from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Override fields from `lookup`, which maps a variable name to its value.
    ///
    /// Only variables that are present are applied.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(env::HOST) {
            self.host = host;
        }
        if let Some(port) = lookup(env::PORT) {
            self.port = parse_var(env::PORT, &port)?;
        }
        if let Some(level) = lookup(env::LOG_LEVEL) {
            self.log_level = LogLevel::from_str(&level)?;
        }
        if let Some(format) = lookup(env::LOG_FORMAT) {
            self.log_format = LogFormat::from_str(&format)?;
        }
        if let Some(environment) = lookup(env::ENVIRONMENT) {
            self.environment = Environment::from_str(&environment)?;
        }
        if let Some(workers) = lookup(env::WORKERS) {
            self.workers = parse_var(env::WORKERS, &workers)?;
        }
        if let Some(batch_size) = lookup(env::BATCH_SIZE) {
            self.batch_size = parse_var(env::BATCH_SIZE, &batch_size)?;
        }
        if let Some(limit) = lookup(env::MAX_TOTAL_POINTS) {
            self.max_total_points = Some(parse_var(env::MAX_TOTAL_POINTS, &limit)?);
        }
        if let Some(timeout) = lookup(env::SHUTDOWN_TIMEOUT_SECS) {
            self.shutdown_timeout_secs = parse_var(env::SHUTDOWN_TIMEOUT_SECS, &timeout)?;
        }
        if let Some(port) = lookup(env::METRICS_PORT) {
            self.metrics_port = Some(parse_var(env::METRICS_PORT, &port)?);
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                name: "batch_size",
                value: "must be at least 1".to_string(),
            });
        }

        if self.max_total_points == Some(0) {
            return Err(ConfigError::InvalidValue {
                name: "max_total_points",
                value: "must be at least 1 when set".to_string(),
            });
        }

        if let Some(metrics_port) = self.metrics_port {
            if metrics_port == 0 {
                return Err(ConfigError::InvalidPort(metrics_port));
            }
            if metrics_port == self.port {
                return Err(ConfigError::InvalidValue {
                    name: "metrics_port",
                    value: format!("{} is already used by the API listener", metrics_port),
                });
            }
        }

        Ok(())
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Worker count after resolving 0 to the number of logical CPUs
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            EstimatorConfig::default().workers()
        } else {
            self.workers
        }
    }

    /// Estimator settings derived from this configuration
    pub fn estimator_config(&self) -> Result<EstimatorConfig, pi_kernel::ConfigError> {
        EstimatorConfig::builder()
            .workers(self.effective_workers())
            .batch_size(self.batch_size)
            .build()
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliArgs) -> Result<(), ConfigError> {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(log_level) = &cli.log_level {
            self.log_level = LogLevel::from_str(log_level)?;
        }
        if let Some(log_format) = &cli.log_format {
            self.log_format = LogFormat::from_str(log_format)?;
        }
        if let Some(workers) = cli.workers {
            self.workers = workers;
        }
        if let Some(metrics_port) = cli.metrics_port {
            self.metrics_port = Some(metrics_port);
        }
        Ok(())
    }
}

/// CLI arguments structure
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Host address override
    pub host: Option<String>,
    /// Port override
    pub port: Option<u16>,
    /// Log level override
    pub log_level: Option<String>,
    /// Log format override
    pub log_format: Option<String>,
    /// Worker count override
    pub workers: Option<usize>,
    /// Metrics exporter port override
    pub metrics_port: Option<u16>,
}

/// Build configuration from all sources
///
/// Priority (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables
/// 3. Config file
/// 4. Default values
pub fn build_config(cli: &CliArgs) -> Result<ServerConfig, ConfigError> {
    let mut config = if let Some(config_path) = &cli.config_file {
        ServerConfig::from_file(config_path)?
    } else {
        ServerConfig::default()
    };

    config.apply_env()?;
    config.merge_with_cli(cli)?;

    config.validate()?;

    Ok(config)
}
