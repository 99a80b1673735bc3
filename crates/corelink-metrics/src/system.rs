//! Host system stats read from procfs.

use std::ffi::CString;
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::fs;

#[derive(Debug, Clone, Serialize)]
pub struct CpuStats {
    pub count_physical: Option<usize>,
    pub count_logical: usize,
    pub percent: f64,
    pub freq_mhz: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    pub total_gb: f64,
    pub used_gb: f64,
    pub available_gb: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiskStats {
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemStats {
    pub hostname: String,
    pub os: String,
    pub uptime_seconds: f64,
    pub cpu: CpuStats,
    pub memory: MemoryStats,
    pub disk: DiskStats,
}

#[derive(Debug, Clone, Copy)]
struct CpuTimes {
    total: u64,
    idle: u64,
}

/// Reads host stats from `/proc`. CPU percent is delta-based, so it needs
/// the previous sample; the monitor keeps that between snapshots.
#[derive(Default)]
pub struct SystemMonitor {
    prev_cpu: Mutex<Option<CpuTimes>>,
}

impl SystemMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> Result<SystemStats> {
        let stat = fs::read_to_string("/proc/stat")
            .await
            .context("reading /proc/stat")?;
        let meminfo = fs::read_to_string("/proc/meminfo")
            .await
            .context("reading /proc/meminfo")?;
        let cpuinfo = fs::read_to_string("/proc/cpuinfo")
            .await
            .context("reading /proc/cpuinfo")?;
        let uptime = fs::read_to_string("/proc/uptime")
            .await
            .context("reading /proc/uptime")?;

        let current = parse_cpu_times(&stat)?;
        let percent = {
            let mut prev = self.prev_cpu.lock().expect("cpu sample lock poisoned");
            let pct = compute_cpu_percent(prev.as_ref(), &current);
            *prev = Some(current);
            pct
        };

        Ok(SystemStats {
            hostname: read_hostname().await,
            os: read_os_name().await,
            uptime_seconds: parse_uptime(&uptime)?,
            cpu: parse_cpu_stats(&cpuinfo, percent),
            memory: parse_memory_stats(&meminfo)?,
            disk: disk_stats("/")?,
        })
    }
}

/// The real hostname is bind-mounted in by the deployment; procfs is the
/// fallback (also host-level under `--pid=host`).
async fn read_hostname() -> String {
    for path in ["/etc/host_hostname", "/proc/sys/kernel/hostname"] {
        if let Ok(contents) = fs::read_to_string(path).await {
            let name = contents.trim();
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }
    "unknown".to_string()
}

async fn read_os_name() -> String {
    if let Ok(contents) = fs::read_to_string("/etc/os-release").await {
        for line in contents.lines() {
            if let Some(value) = line.strip_prefix("PRETTY_NAME=") {
                return value.trim_matches('"').to_string();
            }
        }
    }
    "Linux".to_string()
}

fn parse_cpu_times(contents: &str) -> Result<CpuTimes> {
    let line = contents
        .lines()
        .find(|line| line.starts_with("cpu "))
        .context("missing cpu line in /proc/stat")?;

    let values: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|value| value.parse::<u64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("parsing cpu times")?;

    if values.len() < 4 {
        anyhow::bail!("cpu stats line missing expected fields");
    }

    let idle = values[3] + values.get(4).copied().unwrap_or(0);
    Ok(CpuTimes {
        total: values.iter().sum(),
        idle,
    })
}

fn compute_cpu_percent(prev: Option<&CpuTimes>, current: &CpuTimes) -> f64 {
    let Some(prev) = prev else {
        return 0.0;
    };

    let total_delta = current.total.saturating_sub(prev.total);
    let idle_delta = current.idle.saturating_sub(prev.idle);
    if total_delta == 0 {
        return 0.0;
    }

    let busy_delta = total_delta.saturating_sub(idle_delta);
    round1((busy_delta as f64 / total_delta as f64) * 100.0)
}

fn parse_cpu_stats(cpuinfo: &str, percent: f64) -> CpuStats {
    let count_logical = cpuinfo
        .lines()
        .filter(|l| l.starts_with("processor"))
        .count();

    let mut cores: Vec<(String, String)> = Vec::new();
    let mut physical_id = String::new();
    for line in cpuinfo.lines() {
        if let Some((key, value)) = line.split_once(':') {
            match key.trim() {
                "physical id" => physical_id = value.trim().to_string(),
                "core id" => {
                    let pair = (physical_id.clone(), value.trim().to_string());
                    if !cores.contains(&pair) {
                        cores.push(pair);
                    }
                }
                _ => {}
            }
        }
    }

    let freq_mhz = cpuinfo
        .lines()
        .find(|l| l.starts_with("cpu MHz"))
        .and_then(|l| l.split_once(':'))
        .and_then(|(_, v)| v.trim().parse::<f64>().ok())
        .map(|f| f.round());

    CpuStats {
        count_physical: (!cores.is_empty()).then_some(cores.len()),
        count_logical,
        percent,
        freq_mhz,
    }
}

fn parse_memory_stats(contents: &str) -> Result<MemoryStats> {
    let total_kb = meminfo_kb(contents, "MemTotal:").context("missing MemTotal")?;
    let available_kb = meminfo_kb(contents, "MemAvailable:").context("missing MemAvailable")?;
    let used_kb = total_kb.saturating_sub(available_kb);

    let percent = if total_kb == 0 {
        0.0
    } else {
        round1(used_kb as f64 / total_kb as f64 * 100.0)
    };

    Ok(MemoryStats {
        total_gb: kb_to_gb(total_kb),
        used_gb: kb_to_gb(used_kb),
        available_gb: kb_to_gb(available_kb),
        percent,
    })
}

fn meminfo_kb(contents: &str, key: &str) -> Option<u64> {
    contents
        .lines()
        .find(|l| l.starts_with(key))?
        .split_whitespace()
        .nth(1)?
        .parse::<u64>()
        .ok()
}

fn parse_uptime(contents: &str) -> Result<f64> {
    contents
        .split_whitespace()
        .next()
        .and_then(|v| v.parse::<f64>().ok())
        .context("parsing /proc/uptime")
}

fn disk_stats(path: &str) -> Result<DiskStats> {
    let c_path = CString::new(path).context("invalid disk path")?;
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error()).context("statvfs failed");
    }

    let frsize = stat.f_frsize as u64;
    let total = (stat.f_blocks as u64).saturating_mul(frsize);
    let free = (stat.f_bavail as u64).saturating_mul(frsize);
    let used = total.saturating_sub((stat.f_bfree as u64).saturating_mul(frsize));
    let usable = used + free;
    let percent = if usable == 0 {
        0.0
    } else {
        round1(used as f64 / usable as f64 * 100.0)
    };

    Ok(DiskStats {
        total_gb: bytes_to_gb(total),
        used_gb: bytes_to_gb(used),
        free_gb: bytes_to_gb(free),
        percent,
    })
}

fn kb_to_gb(kb: u64) -> f64 {
    round1(kb as f64 / (1024.0 * 1024.0))
}

fn bytes_to_gb(bytes: u64) -> f64 {
    round1(bytes as f64 / (1024.0 * 1024.0 * 1024.0))
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
