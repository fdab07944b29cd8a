// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// File name of the control socket inside the state directory.
pub const CONTROL_SOCKET_FILE: &str = "ttyd-mux.sock";

/// File name of the daemon log inside the state directory.
pub const LOG_FILE: &str = "daemon.log";

/// Resolve state directory: TTYD_MUX_STATE_DIR > XDG_STATE_HOME/ttyd-mux >
/// ~/.local/state/ttyd-mux
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("TTYD_MUX_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("ttyd-mux"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/ttyd-mux"))
}

/// Control socket path inside the state directory.
pub fn control_socket_path() -> Result<PathBuf, LifecycleError> {
    Ok(state_dir()?.join(CONTROL_SOCKET_FILE))
}

/// I/O timeout on control-socket connections.
pub fn control_timeout() -> Duration {
    std::env::var("TTYD_MUX_CONTROL_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}
