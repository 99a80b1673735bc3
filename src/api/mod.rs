//! REST API for the CoreLink gateway.

pub mod commands;
pub mod containers;
pub mod gpu;
pub mod health;
pub mod overview;
pub mod system;
pub mod update;

use axum::{routing::get, Router};

/// Assemble all REST routes.
pub fn api_router() -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/system/stats", get(system::get_system_stats))
        .route("/api/gpu/stats", get(gpu::get_gpu_stats))
        .route("/api/containers", get(containers::list_containers))
        .route("/api/commands/presets", get(commands::get_presets))
        .route("/api/overview/summary", get(overview::get_overview))
        .route("/api/update/status", get(update::update_status))
        .route("/api/update/version", get(update::current_version))
}
