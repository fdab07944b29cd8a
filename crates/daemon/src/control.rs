// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control socket for the CLI.
//!
//! A stream-oriented Unix socket under the state directory. One UTF-8 line
//! in, one line out, then the server closes the connection. Shutdown
//! variants record a plan on the shared [`ShutdownSignal`]; the main loop
//! stops sessions accordingly before exiting.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, warn};

use crate::env::control_timeout;
use crate::lifecycle::{ShutdownPlan, ShutdownSignal};
use crate::settings::ConfigHandle;

/// Command and response vocabulary of the line protocol.
pub mod protocol {
    pub const PING: &str = "ping";
    pub const PONG: &str = "pong";
    pub const SHUTDOWN: &str = "shutdown";
    pub const SHUTDOWN_WITH_SESSIONS: &str = "shutdown-with-sessions";
    pub const SHUTDOWN_WITH_SESSIONS_KILL_TMUX: &str = "shutdown-with-sessions-kill-tmux";
    pub const RELOAD: &str = "reload";
    pub const OK: &str = "ok";
}

/// Shared daemon context for control-command handlers.
pub struct ControlCtx {
    pub config: ConfigHandle,
    pub shutdown: Arc<ShutdownSignal>,
}

/// Listener task accepting control connections.
pub struct ControlListener {
    listener: UnixListener,
    ctx: Arc<ControlCtx>,
}

impl ControlListener {
    pub fn new(listener: UnixListener, ctx: Arc<ControlCtx>) -> Self {
        Self { listener, ctx }
    }

    /// Accept loop; runs until the task is dropped at shutdown.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            debug!(error = %e, "control connection error");
                        }
                    });
                }
                Err(e) => error!(error = %e, "control accept error"),
            }
        }
    }
}

async fn handle_connection(stream: UnixStream, ctx: &ControlCtx) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let mut line = String::new();
    tokio::time::timeout(control_timeout(), reader.read_line(&mut line))
        .await
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "control read timed out"))??;

    let response = handle_command(line.trim(), ctx);
    tokio::time::timeout(control_timeout(), async {
        writer.write_all(response.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.shutdown().await
    })
    .await
    .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "control write timed out"))??;

    Ok(())
}

/// Dispatch one command line to its response line.
pub(crate) fn handle_command(command: &str, ctx: &ControlCtx) -> String {
    debug!(command, "control command");
    match command {
        protocol::PING => protocol::PONG.to_string(),

        protocol::SHUTDOWN => {
            ctx.shutdown.request(ShutdownPlan::default());
            protocol::OK.to_string()
        }

        protocol::SHUTDOWN_WITH_SESSIONS => {
            ctx.shutdown.request(ShutdownPlan { stop_sessions: true, kill_tmux: false });
            protocol::OK.to_string()
        }

        protocol::SHUTDOWN_WITH_SESSIONS_KILL_TMUX => {
            ctx.shutdown.request(ShutdownPlan { stop_sessions: true, kill_tmux: true });
            protocol::OK.to_string()
        }

        protocol::RELOAD => match ctx.config.reload() {
            Ok(report) => serde_json::to_string(&report)
                .unwrap_or_else(|e| format!("error: {e}")),
            Err(e) => {
                warn!(error = %e, "config reload failed");
                format!("error: {e}")
            }
        },

        other => format!("error: unknown command {other}"),
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
