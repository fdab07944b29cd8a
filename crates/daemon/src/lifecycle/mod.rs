// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

mod startup;

pub use startup::{startup, Daemon};

use std::path::PathBuf;

use parking_lot::Mutex;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::env;
use crate::http::AppState;
use crate::supervisor::StopOptions;

/// Filesystem layout of a running daemon.
#[derive(Debug, Clone)]
pub struct DaemonPaths {
    /// Root state directory (e.g. ~/.local/state/ttyd-mux)
    pub state_dir: PathBuf,
    /// Path to the control socket
    pub control_socket: PathBuf,
    /// Path to the daemon log file
    pub log_path: PathBuf,
}

impl DaemonPaths {
    pub fn resolve() -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;
        Ok(Self {
            control_socket: state_dir.join(env::CONTROL_SOCKET_FILE),
            log_path: state_dir.join(env::LOG_FILE),
            state_dir,
        })
    }
}

/// How the daemon should treat its sessions on the way down.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShutdownPlan {
    pub stop_sessions: bool,
    pub kill_tmux: bool,
}

/// Single-shot shutdown request shared by the control socket, the HTTP
/// API, and signal handlers. The first requester's plan wins.
pub struct ShutdownSignal {
    token: CancellationToken,
    plan: Mutex<ShutdownPlan>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self { token: CancellationToken::new(), plan: Mutex::new(ShutdownPlan::default()) }
    }

    pub fn request(&self, plan: ShutdownPlan) {
        if !self.token.is_cancelled() {
            *self.plan.lock() = plan;
        }
        self.token.cancel();
    }

    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn plan(&self) -> ShutdownPlan {
        *self.plan.lock()
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Tear the daemon down: optionally stop sessions per the requested plan,
/// clear the daemon record, and remove socket files.
pub async fn shutdown(state: &AppState, paths: &DaemonPaths) {
    info!("shutting down daemon...");
    let plan = state.shutdown.plan();

    if plan.stop_sessions {
        match state
            .supervisor
            .stop_all_sessions(StopOptions { kill_tmux: plan.kill_tmux })
            .await
        {
            Ok(stopped) => info!(stopped, "stopped sessions on shutdown"),
            Err(e) => warn!(error = %e, "failed to stop sessions on shutdown"),
        }
    }

    if let Err(e) = state.store.clear_daemon() {
        warn!(error = %e, "failed to clear daemon record");
    }

    if paths.control_socket.exists() {
        if let Err(e) = std::fs::remove_file(&paths.control_socket) {
            warn!(error = %e, "failed to remove control socket file");
        }
    }
    for socket in &state.config.current().listen_sockets {
        if socket.exists() {
            let _ = std::fs::remove_file(socket);
        }
    }

    info!("daemon shutdown complete");
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,

    #[error("daemon already running (pid {pid})")]
    AlreadyRunning { pid: u32 },

    #[error("failed to bind {0}: {1}")]
    BindFailed(String, #[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] tmx_storage::StoreError),

    #[error(transparent)]
    Supervisor(#[from] crate::supervisor::SupervisorError),

    #[error(transparent)]
    Config(#[from] tmx_core::ConfigError),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
