// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::{bail, Result};
use clap::Subcommand;
use tmx_daemon::control::protocol;
use tmx_daemon::lifecycle::DaemonPaths;

use crate::{daemon_process, socket};

#[derive(Subcommand, Debug)]
pub enum DaemonCommand {
    /// Start the daemon in the background
    Start,

    /// Stop the daemon
    Stop {
        /// Also stop all sessions
        #[arg(long)]
        stop_sessions: bool,

        /// Additionally tear down the tmux sessions (implies --stop-sessions)
        #[arg(long)]
        kill_tmux: bool,
    },

    /// Check whether the daemon is responding
    Ping,

    /// Re-read the configuration file
    Reload,
}

pub async fn run(command: DaemonCommand) -> Result<()> {
    let paths = DaemonPaths::resolve()?;
    let socket_path = &paths.control_socket;

    match command {
        DaemonCommand::Start => {
            if socket::ping(socket_path).await {
                println!("Daemon already running.");
                return Ok(());
            }
            daemon_process::ensure_daemon(socket_path).await?;
            println!("Daemon started.");
        }

        DaemonCommand::Stop { stop_sessions, kill_tmux } => {
            let command = if kill_tmux {
                protocol::SHUTDOWN_WITH_SESSIONS_KILL_TMUX
            } else if stop_sessions {
                protocol::SHUTDOWN_WITH_SESSIONS
            } else {
                protocol::SHUTDOWN
            };
            match socket::send_command(socket_path, command).await {
                Ok(response) if response == protocol::OK => println!("Daemon stopping."),
                Ok(response) => bail!("{response}"),
                Err(_) => println!("Daemon is not running."),
            }
        }

        DaemonCommand::Ping => {
            if socket::ping(socket_path).await {
                println!("pong");
            } else {
                bail!("daemon is not responding");
            }
        }

        DaemonCommand::Reload => {
            let response = socket::send_command(socket_path, protocol::RELOAD)
                .await
                .map_err(|_| anyhow::anyhow!("daemon is not responding"))?;
            if let Some(message) = response.strip_prefix("error: ") {
                bail!("{message}");
            }
            let report: serde_json::Value = serde_json::from_str(&response)?;
            let hot = report["hotApplied"].as_array().cloned().unwrap_or_default();
            let restart = report["requiresRestart"].as_array().cloned().unwrap_or_default();
            if hot.is_empty() && restart.is_empty() {
                println!("Configuration unchanged.");
            }
            for key in hot {
                println!("applied: {}", key.as_str().unwrap_or_default());
            }
            for key in restart {
                println!("requires restart: {}", key.as_str().unwrap_or_default());
            }
        }
    }
    Ok(())
}
