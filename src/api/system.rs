//! Host system stats endpoint.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Json;
use axum::Extension;
use tracing::error;

use corelink_metrics::{SystemMonitor, SystemStats};

/// Return host system stats (CPU, RAM, disk, uptime).
pub async fn get_system_stats(
    Extension(system): Extension<Arc<SystemMonitor>>,
) -> Result<Json<SystemStats>, StatusCode> {
    match system.snapshot().await {
        Ok(stats) => Ok(Json(stats)),
        Err(e) => {
            error!(error = %e, "system stats unavailable");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
