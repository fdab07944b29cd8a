// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle supervision.
//!
//! Owns every backend terminal process: allocates its port and URL prefix,
//! spawns it detached, records it in the shared state document, polls for
//! readiness, and tears it down again. Records whose pid has died are
//! pruned on daemon startup and before every list that feeds the router,
//! so path resolution never proxies to a ghost.

mod backend;

pub use backend::{BackendBuilder, BackendSpec, TtydBackend};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::Signal;
use thiserror::Error;
use tmx_core::{
    is_reserved_name, join_url_path, sanitize_session_name, session_name_from_dir, Clock, Session,
};
use tmx_storage::{StateStore, StoreError};
use tracing::{debug, info, warn};

use crate::ports::{PortAllocator, PortError};
use crate::proc::ProcessRunner;
use crate::settings::ConfigHandle;

/// Poll interval while waiting for a spawned backend to bind its port.
const READY_POLL: Duration = Duration::from_millis(100);

/// How long a stopped backend gets to exit after SIGTERM before SIGKILL.
const STOP_GRACE: Duration = Duration::from_secs(2);

/// Poll interval during the stop grace window.
const STOP_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("invalid session name: {0:?}")]
    InvalidName(String),

    #[error("invalid session path: {0:?}")]
    InvalidPath(String),

    #[error("session already running: {0}")]
    AlreadyRunning(String),

    #[error("session path already in use: {0}")]
    PathInUse(String),

    #[error("session not found: {0}")]
    NotFound(String),

    #[error("failed to spawn backend: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("backend for {name} did not become ready on port {port}")]
    StartFailed { name: String, port: u16 },

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Options for starting a session.
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    /// Caller-supplied name; sanitized. Defaults to the directory name.
    pub name: Option<String>,
    /// Working directory the backend is spawned in.
    pub dir: PathBuf,
    /// URL sub-path; defaults to `/<name>`.
    pub path: Option<String>,
}

/// Options for stopping a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopOptions {
    /// Also tear down the named tmux session behind the backend.
    pub kill_tmux: bool,
}

/// Result of startup revalidation.
#[derive(Debug, Default)]
pub struct Revalidation {
    pub valid: Vec<Session>,
    pub removed: Vec<Session>,
}

pub struct SessionSupervisor {
    store: Arc<dyn StateStore>,
    runner: Arc<dyn ProcessRunner>,
    backend: Arc<dyn BackendBuilder>,
    clock: Arc<dyn Clock>,
    config: ConfigHandle,
}

impl SessionSupervisor {
    pub fn new(
        store: Arc<dyn StateStore>,
        runner: Arc<dyn ProcessRunner>,
        backend: Arc<dyn BackendBuilder>,
        clock: Arc<dyn Clock>,
        config: ConfigHandle,
    ) -> Self {
        Self { store, runner, backend, clock, config }
    }

    /// Spawn and record a new session.
    pub async fn start_session(&self, options: StartOptions) -> Result<Session, SupervisorError> {
        let config = self.config.current();

        let name = match options.name.as_deref().filter(|n| !n.is_empty()) {
            Some(raw) => sanitize_session_name(raw),
            None => session_name_from_dir(&options.dir),
        };
        if name.is_empty() || is_reserved_name(&name) {
            return Err(SupervisorError::InvalidName(name));
        }

        // Prunes dead records first so a crashed backend doesn't block its
        // own name.
        let live = self.list_sessions()?;
        if live.iter().any(|s| s.name == name) {
            return Err(SupervisorError::AlreadyRunning(name));
        }

        let path = match options.path {
            Some(raw) => {
                let trimmed = raw.trim_end_matches('/').to_string();
                if !trimmed.starts_with('/') || trimmed.len() < 2 {
                    return Err(SupervisorError::InvalidPath(raw));
                }
                trimmed
            }
            None => format!("/{name}"),
        };
        if live.iter().any(|s| s.path == path) {
            return Err(SupervisorError::PathInUse(path));
        }

        let port = PortAllocator::allocate(&self.store, &self.runner, config.base_port)?;
        let full_path = join_url_path(&config.base_path, &path);

        let command = self.backend.command(&BackendSpec {
            name: &name,
            port,
            full_path: &full_path,
            dir: &options.dir,
        });
        let pid = self.runner.spawn(&command).map_err(SupervisorError::Spawn)?;

        let session = Session {
            name: name.clone(),
            pid,
            port,
            path,
            dir: options.dir,
            started_at: self.clock.now(),
        };
        self.store.add_session(session.clone())?;

        // Readiness: the backend must bind its loopback port within the
        // configured window or the start is rolled back.
        let deadline = tokio::time::Instant::now() + Duration::from_millis(config.start_timeout_ms);
        let mut ready = !self.runner.is_port_available(port);
        while !ready && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(READY_POLL).await;
            ready = !self.runner.is_port_available(port);
        }
        if !ready {
            warn!(name = %name, port, "backend never bound its port, rolling back");
            let _ = self.runner.kill(pid, Signal::SIGKILL);
            let _ = self.store.remove_session(&name);
            return Err(SupervisorError::StartFailed { name, port });
        }

        info!(name = %name, port, pid, path = %session.path, "session started");
        Ok(session)
    }

    /// Stop a session: SIGTERM, bounded grace, then SIGKILL; optionally
    /// tear down the tmux session; remove the record.
    pub async fn stop_session(
        &self,
        name: &str,
        options: StopOptions,
    ) -> Result<(), SupervisorError> {
        let session = self
            .store
            .find_session(name)?
            .ok_or_else(|| SupervisorError::NotFound(name.to_string()))?;

        let _ = self.runner.kill(session.pid, Signal::SIGTERM);
        let deadline = tokio::time::Instant::now() + STOP_GRACE;
        while self.runner.is_process_running(session.pid)
            && tokio::time::Instant::now() < deadline
        {
            tokio::time::sleep(STOP_POLL).await;
        }
        if self.runner.is_process_running(session.pid) {
            debug!(name, pid = session.pid, "grace window elapsed, sending SIGKILL");
            let _ = self.runner.kill(session.pid, Signal::SIGKILL);
        }

        if options.kill_tmux {
            if let Err(e) = self.runner.run("tmux", &["kill-session", "-t", &session.name]) {
                warn!(name, error = %e, "tmux kill-session failed");
            }
        }

        self.store.remove_session(&session.name)?;
        info!(name, "session stopped");
        Ok(())
    }

    /// Stop every recorded session. Failures are logged, not fatal, so one
    /// stuck backend cannot wedge shutdown.
    pub async fn stop_all_sessions(&self, options: StopOptions) -> Result<usize, SupervisorError> {
        let mut stopped = 0;
        for session in self.list_sessions()? {
            match self.stop_session(&session.name, options).await {
                Ok(()) => stopped += 1,
                Err(e) => warn!(name = %session.name, error = %e, "failed to stop session"),
            }
        }
        Ok(stopped)
    }

    /// Currently recorded sessions whose backend is alive. Dead records are
    /// pruned as a side effect.
    pub fn list_sessions(&self) -> Result<Vec<Session>, SupervisorError> {
        let sessions = self.store.sessions()?;
        let (live, dead): (Vec<_>, Vec<_>) =
            sessions.into_iter().partition(|s| self.runner.is_process_running(s.pid));
        if !dead.is_empty() {
            debug!(count = dead.len(), "pruning dead session records");
            self.store.with_doc(&mut |doc| {
                for session in &dead {
                    doc.remove_session(&session.name);
                }
            })?;
        }
        Ok(live)
    }

    /// Startup revalidation: drop every record whose pid is gone.
    pub fn revalidate_sessions(&self) -> Result<Revalidation, SupervisorError> {
        let sessions = self.store.sessions()?;
        let (valid, removed): (Vec<_>, Vec<_>) =
            sessions.into_iter().partition(|s| self.runner.is_process_running(s.pid));
        if !removed.is_empty() {
            self.store.with_doc(&mut |doc| {
                for session in &removed {
                    doc.remove_session(&session.name);
                }
            })?;
        }
        info!(valid = valid.len(), removed = removed.len(), "revalidated sessions");
        Ok(Revalidation { valid, removed })
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
