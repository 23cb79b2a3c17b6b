//! Logging and metrics bootstrap

use std::net::{SocketAddr, ToSocketAddrs};

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LogLevel};

/// Install the global tracing subscriber
///
/// `RUST_LOG`, when set, takes precedence over `log_level`.
pub fn init_tracing(log_level: LogLevel, log_format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_filter_str()));
    let registry = tracing_subscriber::registry().with(filter);

    match log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Address of the Prometheus listener
///
/// `host` may be a name; the first resolved address is used, as for the
/// API listener.
pub fn metrics_addr(host: &str, port: u16) -> std::io::Result<SocketAddr> {
    (host, port).to_socket_addrs()?.next().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            format!("{} resolved to no address", host),
        )
    })
}

/// Install the Prometheus recorder and its HTTP listener
///
/// Must be called from within the Tokio runtime.
pub fn install_metrics_exporter(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    let addr = metrics_addr(host, port)
        .with_context(|| format!("invalid metrics listener address {}:{}", host, port))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("failed to install Prometheus exporter")?;

    metrics::describe_counter!(
        "pi_estimations_total",
        "Estimation requests by outcome"
    );
    metrics::describe_histogram!(
        "pi_estimation_duration_seconds",
        metrics::Unit::Seconds,
        "Wall time of successful estimations"
    );

    Ok(addr)
}
