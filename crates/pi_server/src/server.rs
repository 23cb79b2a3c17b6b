//! Server startup, binding and shutdown
//!
//! Provides functionality to start the Axum server with configurable host/port
//! and to stop it on Ctrl-C / SIGTERM with a bounded drain period. The
//! binary then releases its runtime with [`shutdown_runtime`], which does not
//! wait for estimations the drain gave up on.

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use pi_kernel::Estimator;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::ServerConfig;
use crate::routes;

/// Server instance that can be started
pub struct Server {
    /// Server configuration
    config: Arc<ServerConfig>,
    /// The built router
    router: Router,
}

impl Server {
    /// Create a new server instance with the given configuration and estimator
    pub fn new(config: ServerConfig, estimator: Arc<Estimator>) -> Self {
        let config = Arc::new(config);
        let router = routes::build_router(config.clone(), estimator);

        Self { config, router }
    }

    /// Get the socket address the server will bind to
    ///
    /// Fails when the host is a name rather than an IP address; [`run`](Self::run)
    /// resolves names itself.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.config.socket_addr().parse()
    }

    /// Get the configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run the server
    ///
    /// Binds to the configured host/port and serves requests until a
    /// shutdown signal arrives.
    pub async fn run(self) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.config.socket_addr()).await?;
        self.run_with_listener(listener).await
    }

    /// Run the server with a specific listener
    ///
    /// This is useful for testing where you want to use a listener bound to port 0
    /// to get a random available port.
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run the server until `shutdown` completes
    ///
    /// After `shutdown` resolves, in-flight requests get
    /// `shutdown_timeout_secs` to finish before the server returns anyway.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!("Server listening on {}", addr);

        let timeout = Duration::from_secs(self.config.shutdown_timeout_secs);
        let (stopping_tx, mut stopping_rx) = watch::channel(false);

        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received, draining connections");
                let _ = stopping_tx.send(true);
            })
            .into_future();

        let deadline = async move {
            let signalled = stopping_rx.wait_for(|stopping| *stopping).await.is_ok();
            if !signalled {
                // Server finished without a shutdown signal.
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(timeout).await;
        };

        tokio::select! {
            result = serve => result,
            _ = deadline => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "Graceful shutdown timed out, closing remaining connections"
                );
                Ok(())
            }
        }
    }

    /// Create a test server and return the bound address
    ///
    /// This binds to port 0 to get a random available port, starts the server
    /// in a background task, and returns the actual bound address.
    #[cfg(test)]
    pub async fn spawn_test_server(
        config: ServerConfig,
    ) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = Self::new(config, routes::test_estimator());
        let handle = tokio::spawn(async move {
            server
                .run_until(listener, std::future::pending())
                .await
                .ok();
        });

        (addr, handle)
    }
}

/// Time left to blocking tasks once the server has returned
pub const RUNTIME_SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Shut down the runtime that ran the server
///
/// An estimation abandoned by a timed-out drain keeps its blocking thread
/// busy. That thread gets [`RUNTIME_SHUTDOWN_GRACE`] and is then left
/// behind, so the process exits without waiting for it.
pub fn shutdown_runtime(runtime: tokio::runtime::Runtime) {
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_GRACE);
}

/// Resolves on Ctrl-C, or on SIGTERM where available
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
