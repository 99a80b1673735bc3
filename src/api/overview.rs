//! Aggregated snapshot for the overview dashboard tab.

use std::sync::Arc;

use axum::response::Json;
use axum::Extension;
use serde::Serialize;
use tracing::warn;

use corelink_docker::{ContainerInfo, DockerService};
use corelink_metrics::{GpuDevice, GpuService, SystemMonitor, SystemStats};

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub system: Option<SystemStats>,
    pub containers: ContainersOverview,
    pub gpu: GpuOverview,
}

#[derive(Debug, Serialize)]
pub struct ContainersOverview {
    pub total: usize,
    pub running: usize,
    pub list: Vec<ContainerInfo>,
}

#[derive(Debug, Serialize)]
pub struct GpuOverview {
    pub enabled: bool,
    pub count: usize,
    pub devices: Vec<GpuDevice>,
}

/// Aggregated system + containers + GPU snapshot.
pub async fn get_overview(
    Extension(docker): Extension<Arc<DockerService>>,
    Extension(gpu): Extension<Arc<GpuService>>,
    Extension(system): Extension<Arc<SystemMonitor>>,
) -> Json<OverviewResponse> {
    let system_stats = match system.snapshot().await {
        Ok(stats) => Some(stats),
        Err(e) => {
            warn!(error = %e, "system stats unavailable for overview");
            None
        }
    };

    let containers = docker.list_containers("").await;
    let running = containers.iter().filter(|c| c.status == "running").count();

    let devices = gpu.snapshot().await;

    Json(OverviewResponse {
        system: system_stats,
        containers: ContainersOverview {
            total: containers.len(),
            running,
            list: containers,
        },
        gpu: GpuOverview {
            enabled: gpu.enabled(),
            count: devices.len(),
            devices,
        },
    })
}
