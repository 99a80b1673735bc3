//! GPU stats endpoint.

use std::sync::Arc;

use axum::response::Json;
use axum::Extension;
use serde::Serialize;

use corelink_metrics::{GpuDevice, GpuService};

#[derive(Debug, Serialize)]
pub struct GpuStatsResponse {
    pub enabled: bool,
    pub device_count: usize,
    pub devices: Vec<GpuDevice>,
}

/// Return a snapshot of all GPU stats.
pub async fn get_gpu_stats(Extension(gpu): Extension<Arc<GpuService>>) -> Json<GpuStatsResponse> {
    let devices = gpu.snapshot().await;
    Json(GpuStatsResponse {
        enabled: gpu.enabled(),
        device_count: devices.len(),
        devices,
    })
}
