//! HTTP server lifecycle

use std::future::Future;
use std::net::SocketAddr;

use axum::{middleware, Router};
use deploy_hook_core::api::{CliError, HttpServerConfig};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use crate::http::{
    middleware::{create_middleware_stack, request_logger},
    routes::create_router,
    AppState,
};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

impl From<&HttpServerConfig> for ServerConfig {
    fn from(cfg: &HttpServerConfig) -> Self {
        Self {
            host: cfg.host.clone(),
            port: cfg.port,
        }
    }
}

/// Router with the full middleware stack attached.
pub fn build_app(state: AppState) -> Router {
    create_router(state)
        .layer(middleware::from_fn(request_logger))
        .layer(create_middleware_stack())
}

/// Binds `config` and serves until Ctrl+C or SIGTERM.
pub async fn start_server(config: ServerConfig, state: AppState) -> Result<(), CliError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| CliError::Server(format!("invalid listen address: {e}")))?;

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| CliError::Server(format!("failed to bind {addr}: {e}")))?;

    serve(listener, state, wait_for_signal())
        .await
        .map_err(|e| CliError::Server(e.to_string()))
}

/// Serves on `listener` until `shutdown` resolves. Running scripts are then
/// interrupted so graceful shutdown does not wait on them.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(
        started_at = %state.started_at.to_rfc3339(),
        "HTTP server listening on http://{}",
        addr
    );

    let shutdown_tx = state.shutdown_tx.clone();
    let app = build_app(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Starting graceful shutdown...");
            if shutdown_tx.send(()).is_ok() {
                info!("Interrupting running deployments");
            }
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn wait_for_signal() {
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C signal");
        }
        _ = wait_for_sigterm() => {
            info!("Received SIGTERM signal");
        }
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to install SIGTERM handler");
            std::future::pending::<()>().await
        }
    }
}

/// No SIGTERM on Windows; Ctrl+C still applies.
#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
