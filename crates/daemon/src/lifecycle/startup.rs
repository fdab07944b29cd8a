// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::path::PathBuf;
use std::sync::Arc;

use tmx_core::{Clock, DaemonRecord, MuxConfig, StateStoreKind, SystemClock};
use tmx_storage::{FileStore, MemoryStore, StateStore};
use tokio::net::{TcpListener, UnixListener};
use tracing::info;

use crate::http::proxy::HttpProxy;
use crate::http::AppState;
use crate::proc::{ProcessRunner, SystemRunner};
use crate::settings::ConfigHandle;
use crate::shares::ShareManager;
use crate::supervisor::{Revalidation, SessionSupervisor, TtydBackend};

use super::{DaemonPaths, LifecycleError, ShutdownSignal};

/// Everything a bound-but-not-yet-serving daemon consists of. The caller
/// (main) spawns the servers and the control listener.
pub struct Daemon {
    pub paths: DaemonPaths,
    pub state: AppState,
    pub revalidation: Revalidation,
    pub control_listener: UnixListener,
    pub tcp_listeners: Vec<TcpListener>,
    pub unix_listeners: Vec<UnixListener>,
}

impl std::fmt::Debug for Daemon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Daemon").finish_non_exhaustive()
    }
}

/// Start the daemon: state directory, revalidation, listeners, record.
pub async fn startup(config: MuxConfig, config_path: PathBuf) -> Result<Daemon, LifecycleError> {
    let paths = DaemonPaths::resolve()?;

    // 1. State directory, user-only.
    std::fs::create_dir_all(&paths.state_dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&paths.state_dir, std::fs::Permissions::from_mode(0o700))?;
    }

    let store: Arc<dyn StateStore> = match config.state_store {
        StateStoreKind::File => Arc::new(FileStore::new(&paths.state_dir)),
        StateStoreKind::Memory => Arc::new(MemoryStore::new()),
    };
    let runner: Arc<dyn ProcessRunner> = Arc::new(SystemRunner);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 2. Refuse to start over a live daemon; discard a crashed one's record.
    if let Some(record) = store.daemon()? {
        if runner.is_process_running(record.pid) {
            return Err(LifecycleError::AlreadyRunning { pid: record.pid });
        }
        info!(pid = record.pid, "discarding record of crashed daemon");
        store.clear_daemon()?;
    }

    // 3. Wire components.
    let config_handle = ConfigHandle::new(config, config_path);
    let supervisor = Arc::new(SessionSupervisor::new(
        Arc::clone(&store),
        Arc::clone(&runner),
        Arc::new(TtydBackend),
        Arc::clone(&clock),
        config_handle.clone(),
    ));
    let shares = Arc::new(ShareManager::new(Arc::clone(&store), Arc::clone(&clock)));
    let shutdown = Arc::new(ShutdownSignal::new());

    // 4. Revalidate sessions against live pids.
    let revalidation = supervisor.revalidate_sessions()?;

    // 5. Control socket; remove a stale file from a previous daemon.
    if paths.control_socket.exists() {
        std::fs::remove_file(&paths.control_socket)?;
    }
    let control_listener = UnixListener::bind(&paths.control_socket)
        .map_err(|e| LifecycleError::BindFailed(paths.control_socket.display().to_string(), e))?;

    // 6. Public HTTP listeners.
    let current = config_handle.current();
    let mut tcp_listeners = Vec::new();
    for address in &current.listen_addresses {
        let bind_address = format!("{address}:{}", current.daemon_port);
        let listener = TcpListener::bind(bind_address.as_str())
            .await
            .map_err(|e| LifecycleError::BindFailed(bind_address.clone(), e))?;
        info!(address = %bind_address, "HTTP listener bound");
        tcp_listeners.push(listener);
    }
    let mut unix_listeners = Vec::new();
    for socket_path in &current.listen_sockets {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)?;
        }
        let listener = UnixListener::bind(socket_path)
            .map_err(|e| LifecycleError::BindFailed(socket_path.display().to_string(), e))?;
        info!(path = %socket_path.display(), "HTTP unix listener bound");
        unix_listeners.push(listener);
    }

    // 7. Record ourselves only after every bind succeeded.
    store.set_daemon(DaemonRecord {
        pid: std::process::id(),
        port: current.daemon_port,
        started_at: clock.now(),
    })?;

    let state = AppState {
        store,
        supervisor,
        shares,
        clock,
        config: config_handle,
        shutdown,
        proxy: HttpProxy::new(None),
    };

    info!("daemon started");
    Ok(Daemon { paths, state, revalidation, control_listener, tcp_listeners, unix_listeners })
}
