//! Command safety policy.
//!
//! A command is judged purely on its text and the static policy: blocked
//! substrings always win, then the ordered allow-list of prefixes, then the
//! custom-command escape hatch.

use std::time::Duration;

use serde::Serialize;

/// Dangerous patterns that are always blocked, regardless of the allow-list.
pub const BLOCKED_PATTERNS: &[&str] = &[
    "rm -rf /",
    "rm -rf /*",
    "mkfs",
    "dd if=",
    "> /dev/",
    "chmod 777 /",
    ":(){ :|:&",
    "shutdown",
    "reboot",
    "poweroff",
    "init 0",
    "init 6",
    "halt",
    "kill -9 1",
    "killall",
    "pkill -9",
    "curl | sh",
    "wget | sh",
    "curl | bash",
    "wget | bash",
];

/// Command prefixes allowed by default.
pub const DEFAULT_ALLOWED_PREFIXES: &[&str] = &[
    "npx @nosana/cli",
    "nosana",
    "nvidia-smi",
    "docker ps",
    "docker logs",
    "docker stats",
    "docker inspect",
    "uptime",
    "df -h",
    "free -h",
    "top -bn1",
    "lscpu",
    "lsblk",
    "ip addr",
    "hostname",
    "cat /etc/os-release",
    "uname -a",
];

/// Default per-line read timeout for streamed commands.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

/// Outcome of validating a single command. Produced fresh per command,
/// never cached.
#[derive(Debug, Clone, Serialize)]
pub struct Validation {
    pub allowed: bool,
    pub reason: String,
}

impl Validation {
    fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
        }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// Static execution policy, shared read-only across sessions.
#[derive(Debug, Clone)]
pub struct ExecPolicy {
    /// Ordered prefix allow-list; first match wins.
    pub allowed_prefixes: Vec<String>,
    /// Permit commands matching no prefix.
    pub allow_custom: bool,
    /// Per-line read timeout for streamed output.
    pub timeout: Duration,
}

impl Default for ExecPolicy {
    fn default() -> Self {
        Self {
            allowed_prefixes: DEFAULT_ALLOWED_PREFIXES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            allow_custom: true,
            timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
        }
    }
}

impl ExecPolicy {
    /// Decide whether a raw command string may run.
    ///
    /// Blocked patterns have absolute priority: a command that starts with an
    /// allowed prefix but contains a blocked substring is still rejected.
    pub fn validate(&self, command: &str) -> Validation {
        let cmd = command.trim();

        if cmd.is_empty() {
            return Validation::deny("Empty command");
        }

        for pattern in BLOCKED_PATTERNS {
            if cmd.contains(pattern) {
                return Validation::deny(format!("Command contains blocked pattern: {pattern}"));
            }
        }

        for prefix in &self.allowed_prefixes {
            if cmd.starts_with(prefix.as_str()) {
                return Validation::allow("Matches allowed prefix");
            }
        }

        if self.allow_custom {
            return Validation::allow("Custom commands enabled");
        }

        Validation::deny("Command does not match any allowed prefix")
    }
}
