//! Pi Estimation Server
//!
//! REST API server for Monte Carlo estimation of pi.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use pi_kernel::Estimator;
use pi_server::config::{build_config, env, CliArgs as ConfigCliArgs, ServerConfig};
use pi_server::server::{self, Server};
use pi_server::telemetry;

/// Pi Estimation Server - REST API for Monte Carlo estimation of pi
#[derive(Parser, Debug)]
#[command(name = "pi_server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML format)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Host address to bind to
    #[arg(long, env = env::HOST)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = env::PORT)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = env::LOG_LEVEL)]
    log_level: Option<String>,

    /// Log format (pretty, json)
    #[arg(long, env = env::LOG_FORMAT)]
    log_format: Option<String>,

    /// Estimation worker threads (0 = one per logical CPU)
    #[arg(short, long, env = env::WORKERS)]
    workers: Option<usize>,

    /// Port for the Prometheus metrics listener
    #[arg(long, env = env::METRICS_PORT)]
    metrics_port: Option<u16>,
}

impl From<Args> for ConfigCliArgs {
    fn from(args: Args) -> Self {
        ConfigCliArgs {
            config_file: args.config,
            host: args.host,
            port: args.port,
            log_level: args.log_level,
            log_format: args.log_format,
            workers: args.workers,
            metrics_port: args.metrics_port,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cli_args: ConfigCliArgs = args.into();
    let config = build_config(&cli_args)?;

    telemetry::init_tracing(config.log_level, config.log_format);

    tracing::info!("Pi Estimation Server v{}", pi_server::VERSION);
    tracing::info!(
        host = %config.host,
        port = %config.port,
        log_level = %config.log_level,
        log_format = %config.log_format,
        environment = %config.environment,
        workers = config.effective_workers(),
        batch_size = config.batch_size,
        max_total_points = ?config.max_total_points,
        metrics_port = ?config.metrics_port,
        "Server configuration loaded"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(serve(config));
    server::shutdown_runtime(runtime);
    tracing::info!("Server stopped");

    result
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    if let Some(port) = config.metrics_port {
        let addr = telemetry::install_metrics_exporter(&config.host, port)?;
        tracing::info!(address = %addr, "Prometheus exporter listening");
    }

    let estimator = Arc::new(Estimator::new(config.estimator_config()?)?);

    let server = Server::new(config, estimator);
    tracing::info!(address = %server.config().socket_addr(), "Starting server");

    server.run().await?;
    Ok(())
}
