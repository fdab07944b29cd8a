// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::{Context, Result};
use tmx_daemon::http::api::CreateSessionRequest;
use tmx_daemon::lifecycle::DaemonPaths;

use crate::daemon_process;

use super::api_client;

pub async fn run(dir: String, name: Option<String>, path: Option<String>) -> Result<()> {
    let dir = std::fs::canonicalize(&dir)
        .with_context(|| format!("no such directory: {dir}"))?;

    let paths = DaemonPaths::resolve()?;
    daemon_process::ensure_daemon(&paths.control_socket).await?;

    let (config, client) = api_client()?;
    let session = client
        .create_session(&CreateSessionRequest { name, dir, path })
        .await?;

    let host = config
        .listen_addresses
        .first()
        .map(|a| a.as_str())
        .filter(|a| *a != "0.0.0.0")
        .unwrap_or("127.0.0.1");
    println!("Session '{}' started.", session.session.name);
    println!("  http://{host}:{}{}/", config.daemon_port, session.full_path);
    Ok(())
}
