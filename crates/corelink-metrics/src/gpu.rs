//! GPU stats via `nvidia-smi` executed in the host namespaces.

use std::time::Duration;

use corelink_host::run_host_capture;
use serde::Serialize;
use tracing::warn;

const NVIDIA_SMI_TIMEOUT: Duration = Duration::from_secs(10);

const QUERY_FIELDS: &str = "index,name,temperature.gpu,utilization.gpu,\
utilization.memory,memory.used,memory.total,memory.free,\
power.draw,power.limit,fan.speed";

/// Stats for one GPU device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpuDevice {
    pub index: u32,
    pub name: String,
    pub temperature_c: i64,
    pub gpu_utilization_pct: u32,
    pub memory_utilization_pct: u32,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    pub memory_free_mb: u64,
    pub power_draw_w: f64,
    pub power_limit_w: f64,
    /// Some GPUs don't report fan speed.
    pub fan_speed_pct: Option<u32>,
}

/// GPU metrics collector. Disabled nodes report no devices.
pub struct GpuService {
    enabled: bool,
}

impl GpuService {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Snapshot all GPUs by running `nvidia-smi` on the host.
    pub async fn snapshot(&self) -> Vec<GpuDevice> {
        if !self.enabled {
            return Vec::new();
        }

        let query = format!("--query-gpu={QUERY_FIELDS}");
        let args = ["nvidia-smi", &query, "--format=csv,noheader,nounits"];
        match run_host_capture(&args, NVIDIA_SMI_TIMEOUT).await {
            Ok(output) => parse_nvidia_smi(&output),
            Err(e) => {
                warn!(error = %e, "nvidia-smi snapshot failed");
                Vec::new()
            }
        }
    }
}

/// Parse `nvidia-smi` CSV output; malformed rows are skipped.
fn parse_nvidia_smi(output: &str) -> Vec<GpuDevice> {
    output.lines().filter_map(parse_row).collect()
}

fn parse_row(line: &str) -> Option<GpuDevice> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 11 {
        return None;
    }

    Some(GpuDevice {
        index: parts[0].parse().ok()?,
        name: parts[1].to_string(),
        temperature_c: parts[2].parse().ok()?,
        gpu_utilization_pct: parts[3].parse().ok()?,
        memory_utilization_pct: parts[4].parse().ok()?,
        memory_used_mb: parts[5].parse().ok()?,
        memory_total_mb: parts[6].parse().ok()?,
        memory_free_mb: parts[7].parse().ok()?,
        power_draw_w: parts[8].parse().ok()?,
        power_limit_w: parts[9].parse().ok()?,
        fan_speed_pct: parts[10].parse().ok(),
    })
}
