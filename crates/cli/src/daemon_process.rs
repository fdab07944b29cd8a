// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawning the daemon as a detached background process.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};

use crate::socket;

/// Resolve the daemon binary: explicit override, then a sibling of the
/// CLI binary, then `$PATH`.
fn daemon_binary() -> PathBuf {
    if let Ok(explicit) = std::env::var("TTYD_MUX_DAEMON_BINARY") {
        return PathBuf::from(explicit);
    }
    if let Ok(exe) = std::env::current_exe() {
        let sibling = exe.with_file_name("ttyd-muxd");
        if sibling.exists() {
            return sibling;
        }
    }
    PathBuf::from("ttyd-muxd")
}

/// Spawn the daemon detached: its own process group, stdio on /dev/null,
/// so it outlives this CLI invocation.
pub fn spawn_daemon() -> std::io::Result<()> {
    let mut command = std::process::Command::new(daemon_binary());
    command
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    command.spawn()?;
    Ok(())
}

/// Make sure a daemon is answering on the control socket, spawning one if
/// necessary.
pub async fn ensure_daemon(socket_path: &Path) -> Result<()> {
    if socket::ping(socket_path).await {
        return Ok(());
    }

    spawn_daemon()?;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if socket::ping(socket_path).await {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    bail!("daemon did not come up within 5s (check the daemon log in the state directory)");
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
