//! Server configuration types
//!
//! Contains all configuration structures for the CoreLink gateway.

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub docker: DockerConfig,
    #[serde(default)]
    pub gpu: GpuConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub logs: LogsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            docker: DockerConfig::default(),
            gpu: GpuConfig::default(),
            commands: CommandsConfig::default(),
            logs: LogsConfig::default(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8585
}

/// Docker collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerConfig {
    #[serde(default = "default_socket_path")]
    pub socket_path: String,
    /// Name substring identifying the node's workload containers.
    #[serde(default = "default_container_pattern")]
    pub container_pattern: String,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            container_pattern: default_container_pattern(),
        }
    }
}

fn default_socket_path() -> String {
    "/var/run/docker.sock".to_string()
}

fn default_container_pattern() -> String {
    "nosana".to_string()
}

/// GPU metrics configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpuConfig {
    #[serde(default)]
    pub enabled: bool,
}

/// Command execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
    #[serde(default = "default_allowed_prefixes")]
    pub allowed_prefixes: Vec<String>,
    #[serde(default = "default_true")]
    pub allow_custom: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            allowed_prefixes: default_allowed_prefixes(),
            allow_custom: true,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_allowed_prefixes() -> Vec<String> {
    corelink_host::policy::DEFAULT_ALLOWED_PREFIXES
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    corelink_host::policy::DEFAULT_COMMAND_TIMEOUT_SECS
}

/// Log streaming configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    /// Lines of history requested when a log session opens.
    #[serde(default = "default_tail")]
    pub tail: usize,
    /// Bounded queue capacity per log session.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Worker pool size shared by all concurrent log sessions.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            tail: default_tail(),
            queue_capacity: default_queue_capacity(),
            workers: default_workers(),
        }
    }
}

fn default_tail() -> usize {
    200
}

fn default_queue_capacity() -> usize {
    corelink_docker::bridge::DEFAULT_QUEUE_CAPACITY
}

fn default_workers() -> usize {
    corelink_docker::bridge::DEFAULT_WORKERS
}

impl CommandsConfig {
    /// Build the execution policy from configuration values.
    pub fn to_policy(&self) -> corelink_host::ExecPolicy {
        corelink_host::ExecPolicy {
            allowed_prefixes: self.allowed_prefixes.clone(),
            allow_custom: self.allow_custom,
            timeout: std::time::Duration::from_secs(self.timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_deployment_profile() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8585);
        assert_eq!(config.docker.socket_path, "/var/run/docker.sock");
        assert_eq!(config.docker.container_pattern, "nosana");
        assert!(!config.gpu.enabled);
        assert!(config.commands.allow_custom);
        assert_eq!(config.commands.timeout_secs, 30);
        assert_eq!(config.logs.tail, 200);
        assert_eq!(config.logs.queue_capacity, 100);
        assert_eq!(config.logs.workers, 4);
    }

    #[test]
    fn empty_toml_deserializes_to_defaults() {
        let config: AppConfig = toml_from_str("");
        assert_eq!(config.server.port, AppConfig::default().server.port);
        assert!(!config.commands.allowed_prefixes.is_empty());
    }

    fn toml_from_str(s: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(s, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn policy_reflects_configuration() {
        let commands = CommandsConfig {
            allowed_prefixes: vec!["uptime".to_string()],
            allow_custom: false,
            timeout_secs: 5,
        };
        let policy = commands.to_policy();
        assert!(!policy.allow_custom);
        assert_eq!(policy.timeout.as_secs(), 5);
        assert!(policy.validate("uptime").allowed);
        assert!(!policy.validate("ls").allowed);
    }
}
