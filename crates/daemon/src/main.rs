// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ttyd-mux daemon (ttyd-muxd)
//!
//! Long-lived background process that owns the session fleet: it serves
//! the portal, control API, share links, and reverse proxy on the public
//! HTTP listener(s), and answers the CLI on a local control socket.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;

use tmx_core::MuxConfig;
use tmx_daemon::control::{ControlCtx, ControlListener};
use tmx_daemon::http;
use tmx_daemon::lifecycle::{self, Daemon, DaemonPaths, LifecycleError, ShutdownPlan};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config or socket work
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("ttyd-muxd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("ttyd-muxd {}", env!("CARGO_PKG_VERSION"));
                println!("ttyd-mux daemon - supervises web-terminal sessions behind one HTTP endpoint");
                println!();
                println!("USAGE:");
                println!("    ttyd-muxd");
                println!();
                println!("The daemon is typically started by the `ttyd-mux` CLI and should");
                println!("not be invoked directly. It serves HTTP on the configured");
                println!("daemon_port and listens for CLI commands on a Unix socket.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: ttyd-muxd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config_path = MuxConfig::default_path();
    let config = MuxConfig::load(&config_path)?;

    let paths = DaemonPaths::resolve()?;
    rotate_log_if_needed(&paths.log_path);
    let log_guard = setup_logging(&paths)?;

    info!("starting ttyd-mux daemon");

    let daemon = match lifecycle::startup(config, config_path).await {
        Ok(daemon) => daemon,
        Err(LifecycleError::AlreadyRunning { pid }) => {
            eprintln!("ttyd-muxd is already running");
            eprintln!("  pid: {pid}");
            std::process::exit(1);
        }
        Err(e) => {
            error!("failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let Daemon { paths, state, revalidation, control_listener, tcp_listeners, unix_listeners } =
        daemon;

    if !revalidation.removed.is_empty() {
        info!(
            removed = revalidation.removed.len(),
            valid = revalidation.valid.len(),
            "removed stale session records at startup"
        );
    }

    // Control socket listener task
    let control_ctx = Arc::new(ControlCtx {
        config: state.config.clone(),
        shutdown: Arc::clone(&state.shutdown),
    });
    tokio::spawn(ControlListener::new(control_listener, control_ctx).run());

    // HTTP servers, one task per listener, all sharing the router
    let app = http::router(state.clone());
    let mut server_tasks = Vec::new();
    for listener in tcp_listeners {
        // connect info feeds the proxy's X-Forwarded-For
        let app = app
            .clone()
            .into_make_service_with_connect_info::<std::net::SocketAddr>();
        let shutdown = Arc::clone(&state.shutdown);
        server_tasks.push(tokio::spawn(async move {
            let serve = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await });
            if let Err(e) = serve.await {
                error!(error = %e, "HTTP server error");
            }
        }));
    }
    for listener in unix_listeners {
        let app = app.clone();
        let shutdown = Arc::clone(&state.shutdown);
        server_tasks.push(tokio::spawn(async move {
            let serve = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await });
            if let Err(e) = serve.await {
                error!(error = %e, "HTTP unix server error");
            }
        }));
    }

    spawn_share_sweeper(Arc::clone(&state.shares));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(socket = %paths.control_socket.display(), "daemon ready");
    println!("READY");

    tokio::select! {
        _ = state.shutdown.cancelled() => {
            info!("shutdown requested via control plane");
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, shutting down...");
            state.shutdown.request(ShutdownPlan::default());
        }
        _ = sigint.recv() => {
            info!("received SIGINT, shutting down...");
            state.shutdown.request(ShutdownPlan::default());
        }
    }

    // Bounded drain of in-flight requests, then tear down.
    let drain = async {
        for task in server_tasks {
            let _ = task.await;
        }
    };
    if tokio::time::timeout(std::time::Duration::from_secs(5), drain).await.is_err() {
        info!("drain window elapsed with requests still in flight");
    }

    lifecycle::shutdown(&state, &paths).await;
    info!("daemon stopped");
    Ok(())
}

/// Interval between background sweeps of expired shares. Expiry is also
/// enforced lazily on every lookup; the sweep just keeps the state file
/// from accumulating dead tokens while nobody validates.
const SHARE_SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

/// Spawn a task that periodically removes expired shares.
fn spawn_share_sweeper(shares: Arc<tmx_daemon::ShareManager>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SHARE_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match shares.cleanup_expired() {
                Ok(0) => {}
                Ok(removed) => info!(removed, "swept expired shares"),
                Err(e) => error!(error = %e, "share sweep failed"),
            }
        }
    });
}

/// Size threshold that triggers log rotation at startup (10 MB).
const LOG_ROTATE_BYTES: u64 = 10 * 1024 * 1024;

/// Numbered log slots kept next to the live log file.
const LOG_KEEP: u32 = 3;

/// Keep the daemon log from growing without bound.
///
/// Runs once per start. An oversized live log moves into slot `.1` after
/// the older slots shift up one, and the content of the last slot is
/// dropped. Every step is allowed to fail individually; a half-rotated
/// log is still appendable and must never keep the daemon from starting.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let oversized = std::fs::metadata(log_path)
        .map(|meta| meta.len() >= LOG_ROTATE_BYTES)
        .unwrap_or(false);
    if !oversized {
        return;
    }

    let slot = |n: u32| {
        let mut name = log_path.as_os_str().to_owned();
        name.push(format!(".{n}"));
        std::path::PathBuf::from(name)
    };

    let _ = std::fs::remove_file(slot(LOG_KEEP));
    for n in (1..LOG_KEEP).rev() {
        let _ = std::fs::rename(slot(n), slot(n + 1));
    }
    let _ = std::fs::rename(log_path, slot(1));
}

fn setup_logging(
    paths: &DaemonPaths,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    std::fs::create_dir_all(&paths.state_dir)?;

    let file_appender = tracing_appender::rolling::never(
        &paths.state_dir,
        paths.log_path.file_name().ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
