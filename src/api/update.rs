//! Update status inspection.
//!
//! The actual update runs as a detached script on the host; the gateway only
//! reads its log through the shared nsenter prefix and classifies progress.

use std::time::Duration;

use axum::response::Json;
use serde::Serialize;
use tracing::warn;

use corelink_host::run_host_capture;

const UPDATE_LOG_PATH: &str = "/tmp/corelink-update.log";
const UPDATE_LOG_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
pub struct UpdateStatusResponse {
    pub status: &'static str,
    pub log: String,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
}

/// Read the host-side update log and classify progress.
pub async fn update_status() -> Json<UpdateStatusResponse> {
    let script = format!("cat {UPDATE_LOG_PATH} 2>/dev/null || echo 'No update log found'");
    match run_host_capture(&["bash", "-c", &script], UPDATE_LOG_TIMEOUT).await {
        Ok(log) => {
            let log = log.trim().to_string();
            Json(UpdateStatusResponse {
                status: classify_update_log(&log),
                log,
            })
        }
        Err(e) => {
            warn!(error = %e, "update log read failed");
            Json(UpdateStatusResponse {
                status: "unknown",
                log: e.to_string(),
            })
        }
    }
}

/// Return the current running version (used by the frontend after reconnect).
pub async fn current_version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn classify_update_log(log: &str) -> &'static str {
    if log.contains("Update complete") {
        "complete"
    } else if log.to_lowercase().contains("failed") {
        "failed"
    } else {
        "updating"
    }
}
