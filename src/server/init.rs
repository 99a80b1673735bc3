//! Server initialization
//!
//! Builds the shared services, assembles the router, and serves.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use corelink_docker::{DockerService, LogStreamBridge};
use corelink_host::HostRunner;
use corelink_metrics::{GpuService, SystemMonitor};

/// Run the server
pub async fn run() -> Result<()> {
    let config = super::load_config()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        gpu = config.gpu.enabled,
        "CoreLink gateway starting"
    );

    let docker = Arc::new(DockerService::new(&config.docker.socket_path));
    if !docker.available() {
        info!("docker unavailable; container features degraded");
    }
    let runner = Arc::new(HostRunner::new(config.commands.to_policy()));
    let gpu = Arc::new(GpuService::new(config.gpu.enabled));
    let system = Arc::new(SystemMonitor::new());
    let bridge = Arc::new(LogStreamBridge::new(
        config.logs.workers,
        config.logs.queue_capacity,
    ));
    let config = Arc::new(config);

    let app = Router::new()
        .merge(crate::api::api_router())
        .merge(crate::websocket::websocket_router())
        .route("/", get(|| async { "CoreLink gateway" }))
        .layer(Extension(config.clone()))
        .layer(Extension(docker))
        .layer(Extension(runner))
        .layer(Extension(gpu))
        .layer(Extension(system))
        .layer(Extension(bridge))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    info!("HTTP server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("CoreLink shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
