//! REST API server for Monte Carlo pi estimation
//!
//! This crate exposes [`pi_kernel`] over HTTP: a single estimation endpoint
//! plus health and readiness probes.

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod telemetry;

// Re-export the estimation engine for integration
pub use pi_kernel;

/// Server version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
