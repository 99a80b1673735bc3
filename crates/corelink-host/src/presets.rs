//! Preset command catalog for the dashboard button UI.
//!
//! Immutable, loaded once; every preset must itself satisfy the default
//! execution policy.

use serde::Serialize;

/// One pre-written command offered in the UI.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CommandPreset {
    pub id: &'static str,
    pub label: &'static str,
    pub command: &'static str,
    pub description: &'static str,
    pub category: &'static str,
}

/// The full preset catalog.
pub fn preset_catalog() -> &'static [CommandPreset] {
    PRESET_COMMANDS
}

const PRESET_COMMANDS: &[CommandPreset] = &[
    CommandPreset {
        id: "node_status",
        label: "Node Status",
        command: "npx @nosana/cli@latest node view",
        description: "Display current Nosana node information",
        category: "nosana",
    },
    CommandPreset {
        id: "nosana_version",
        label: "Nosana Version",
        command: "npx @nosana/cli@latest --version",
        description: "Show Nosana CLI version",
        category: "nosana",
    },
    CommandPreset {
        id: "gpu_info",
        label: "GPU Info",
        command: "nvidia-smi",
        description: "Full NVIDIA GPU diagnostic output",
        category: "gpu",
    },
    CommandPreset {
        id: "gpu_processes",
        label: "GPU Processes",
        command: "nvidia-smi --query-compute-apps=pid,name,used_memory --format=csv",
        description: "Show processes using GPU memory",
        category: "gpu",
    },
    CommandPreset {
        id: "disk_usage",
        label: "Disk Usage",
        command: "df -h",
        description: "Show disk space usage",
        category: "system",
    },
    CommandPreset {
        id: "memory_usage",
        label: "Memory Usage",
        command: "free -h",
        description: "Show RAM usage",
        category: "system",
    },
    CommandPreset {
        id: "docker_ps",
        label: "Docker Containers",
        command: "docker ps --format 'table {{.Names}}\\t{{.Status}}\\t{{.Image}}'",
        description: "List running Docker containers",
        category: "docker",
    },
    CommandPreset {
        id: "system_uptime",
        label: "System Uptime",
        command: "uptime",
        description: "Show system uptime and load averages",
        category: "system",
    },
    CommandPreset {
        id: "os_info",
        label: "OS Info",
        command: "cat /etc/os-release",
        description: "Show operating system details",
        category: "system",
    },
    CommandPreset {
        id: "network_info",
        label: "Network Info",
        command: "ip addr show",
        description: "Show network interface configuration",
        category: "system",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ExecPolicy;

    #[test]
    fn catalog_is_nonempty_with_unique_ids() {
        let catalog = preset_catalog();
        assert!(!catalog.is_empty());
        let mut ids: Vec<_> = catalog.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn every_preset_passes_the_default_policy() {
        let policy = ExecPolicy::default();
        for preset in preset_catalog() {
            let v = policy.validate(preset.command);
            assert!(v.allowed, "preset {} rejected: {}", preset.id, v.reason);
        }
    }

    #[test]
    fn presets_serialize_with_all_fields() {
        let json = serde_json::to_value(preset_catalog()[0]).unwrap();
        for field in ["id", "label", "command", "description", "category"] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
    }
}
