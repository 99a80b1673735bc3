//! Shared nsenter invocation prefix and one-shot captured execution.
//!
//! The same prefix is used everywhere CoreLink reaches into the host:
//! interactive command execution, the nvidia-smi metrics fallback, and
//! update-log inspection.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{Error, Result};

/// Enters the host's mount, UTS, IPC, network and PID namespaces from the
/// container (target PID 1 = host init). Requires `--pid=host` and a
/// privileged container.
pub const NSENTER_PREFIX: &[&str] = &["nsenter", "-t", "1", "-m", "-u", "-i", "-n", "-p", "--"];

/// Run a command on the host and capture its stdout as a lossy UTF-8 string.
///
/// Used for short, bounded reads (GPU CSV snapshot, update log); interactive
/// streaming goes through [`crate::runner::HostRunner`] instead.
pub async fn run_host_capture(args: &[&str], timeout: Duration) -> Result<String> {
    let mut argv: Vec<&str> = NSENTER_PREFIX.to_vec();
    argv.extend_from_slice(args);
    capture(&argv, timeout).await
}

async fn capture(argv: &[&str], timeout: Duration) -> Result<String> {
    let mut cmd = Command::new(argv[0]);
    cmd.args(&argv[1..])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // Timing out drops the wait future and with it the child handle.
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|e| Error::Spawn(e.to_string()))?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| Error::Timeout(timeout.as_secs()))?
        .map_err(|e| Error::Spawn(e.to_string()))?;

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
