//! Host process runner: spawns a validated command in the host namespaces
//! and streams its output line by line.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::nsenter::NSENTER_PREFIX;
use crate::policy::ExecPolicy;

/// Internal channel depth between the read loop and the consumer.
const LINE_CHANNEL_CAPACITY: usize = 64;

/// Spawns commands through nsenter and streams merged stdout/stderr lines.
///
/// Stateless apart from configuration; each `run` call owns exactly one
/// process, and the returned receiver is finite and never restartable.
#[derive(Debug, Clone)]
pub struct HostRunner {
    policy: ExecPolicy,
    prefix: Vec<String>,
}

impl HostRunner {
    pub fn new(policy: ExecPolicy) -> Self {
        Self {
            policy,
            prefix: NSENTER_PREFIX.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Runner without the nsenter prefix, for deployments running directly
    /// on the host (and for tests, which cannot enter namespaces).
    pub fn without_nsenter(policy: ExecPolicy) -> Self {
        Self {
            policy,
            prefix: Vec::new(),
        }
    }

    pub fn policy(&self) -> &ExecPolicy {
        &self.policy
    }

    /// Validate and run `command`, streaming output lines.
    ///
    /// The receiver yields each output line with its trailing newline, then
    /// exactly one of: an exit-code line, a `[TIMEOUT]` line (process
    /// killed), or an `[ERROR]` line (spawn failure). A command rejected by
    /// policy yields a single `[BLOCKED]` line and spawns nothing.
    pub fn run(&self, command: &str) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);

        let validation = self.policy.validate(command);
        if !validation.allowed {
            debug!(command, reason = %validation.reason, "command rejected by policy");
            tokio::spawn(async move {
                let _ = tx.send(format!("[BLOCKED] {}\n", validation.reason)).await;
            });
            return rx;
        }

        // `exec 2>&1` merges stderr into the pipe for the whole script, so
        // lines arrive in the order the process produced them.
        let script = format!("exec 2>&1\n{}", command.trim());
        let mut argv: Vec<String> = self.prefix.clone();
        argv.extend(["bash".to_string(), "-c".to_string(), script]);

        let timeout = self.policy.timeout;
        tokio::spawn(async move {
            stream_process(argv, timeout, tx).await;
        });
        rx
    }
}

async fn stream_process(argv: Vec<String>, timeout: Duration, tx: mpsc::Sender<String>) {
    let mut cmd = Command::new(&argv[0]);
    cmd.args(&argv[1..])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let _ = tx
                .send(
                    "[ERROR] nsenter not found. Is the container running with --pid=host?\n"
                        .to_string(),
                )
                .await;
            return;
        }
        Err(e) => {
            let _ = tx.send(format!("[ERROR] {e}\n")).await;
            return;
        }
    };

    let Some(stdout) = child.stdout.take() else {
        let _ = tx.send("[ERROR] failed to capture process output\n".to_string()).await;
        let _ = child.start_kill();
        return;
    };
    let mut lines = BufReader::new(stdout).lines();

    // The script merges its own stderr with `exec 2>&1`, but anything written
    // before bash runs, nsenter failing to enter a namespace above all, only
    // ever reaches the stderr pipe. Forward those lines too.
    if let Some(stderr) = child.stderr.take() {
        let err_tx = tx.clone();
        tokio::spawn(async move {
            let mut err_lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = err_lines.next_line().await {
                if err_tx.send(format!("{line}\n")).await.is_err() {
                    break;
                }
            }
        });
    }

    loop {
        match tokio::time::timeout(timeout, lines.next_line()).await {
            Ok(Ok(Some(line))) => {
                if tx.send(format!("{line}\n")).await.is_err() {
                    // Consumer gone; stop reading and reap the process.
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    return;
                }
            }
            Ok(Ok(None)) => break,
            Ok(Err(e)) => {
                warn!(error = %e, "host process read error");
                let _ = tx.send(format!("[ERROR] {e}\n")).await;
                let _ = child.start_kill();
                let _ = child.wait().await;
                return;
            }
            Err(_) => {
                let _ = tx
                    .send("\n[TIMEOUT] Command exceeded time limit.\n".to_string())
                    .await;
                kill_and_reap(&mut child).await;
                return;
            }
        }
    }

    match child.wait().await {
        Ok(status) => {
            let code = status.code().unwrap_or(-1);
            let _ = tx.send(format!("\n[Exit code: {code}]\n")).await;
        }
        Err(e) => {
            let _ = tx.send(format!("[ERROR] {e}\n")).await;
        }
    }
}

async fn kill_and_reap(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        warn!(error = %e, "failed to kill timed-out process");
    }
    let _ = child.wait().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ExecPolicy;

    fn permissive(timeout_secs: u64) -> HostRunner {
        HostRunner::without_nsenter(ExecPolicy {
            allowed_prefixes: Vec::new(),
            allow_custom: true,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    async fn collect(mut rx: mpsc::Receiver<String>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            lines.push(line);
        }
        lines
    }

    #[tokio::test]
    async fn yields_lines_then_exit_code() {
        let runner = permissive(10);
        let lines = collect(runner.run("printf 'a\\nb\\n'")).await;
        assert_eq!(lines, vec!["a\n", "b\n", "\n[Exit code: 0]\n"]);
    }

    #[tokio::test]
    async fn nonzero_exit_code_is_reported() {
        let runner = permissive(10);
        let lines = collect(runner.run("exit 3")).await;
        assert_eq!(lines.last().unwrap(), "\n[Exit code: 3]\n");
    }

    #[tokio::test]
    async fn stderr_is_merged_into_the_stream() {
        let runner = permissive(10);
        let lines = collect(runner.run("echo oops >&2")).await;
        assert_eq!(lines[0], "oops\n");
    }

    #[tokio::test]
    async fn timeout_kills_the_process_and_ends_the_stream() {
        let runner = permissive(1);
        let lines = collect(runner.run("echo started && sleep 30")).await;
        assert_eq!(lines[0], "started\n");
        assert!(lines.last().unwrap().contains("[TIMEOUT]"));
        assert!(!lines.iter().any(|l| l.contains("[Exit code:")));
    }

    #[tokio::test]
    async fn rejected_command_yields_single_blocked_line() {
        let runner = HostRunner::without_nsenter(ExecPolicy {
            allowed_prefixes: vec!["uptime".to_string()],
            allow_custom: false,
            timeout: Duration::from_secs(5),
        });
        let lines = collect(runner.run("ls /")).await;
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[BLOCKED] "));
    }

    #[tokio::test]
    async fn prefix_diagnostics_reach_the_stream() {
        // Simulates nsenter refusing to enter the host namespaces: it writes
        // its diagnostic to stderr and exits before bash ever runs, so the
        // script-level stderr redirect cannot catch it.
        let mut runner = permissive(10);
        runner.prefix = vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo 'cannot open /proc/1/ns/mnt: Permission denied' >&2; exit 1".to_string(),
        ];
        let lines = collect(runner.run("uptime")).await;
        assert!(lines.iter().any(|l| l.contains("Permission denied")), "got {lines:?}");
        assert!(lines.iter().any(|l| l.contains("[Exit code: 1]")));
    }

    #[tokio::test]
    async fn missing_executable_yields_error_line() {
        let mut runner = permissive(5);
        runner.prefix = vec!["corelink-test-definitely-missing".to_string()];
        let lines = collect(runner.run("uptime")).await;
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[ERROR] "));
    }
}
