// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::Result;
use tmx_daemon::http::api::CreateShareRequest;

use crate::output;

use super::api_client;

pub async fn create(name: String, expires: Option<String>) -> Result<()> {
    let (config, client) = api_client()?;
    let share = client
        .create_share(&CreateShareRequest { session_name: name, expires_in: expires })
        .await?;

    let host = config
        .listen_addresses
        .first()
        .map(|a| a.as_str())
        .filter(|a| *a != "0.0.0.0")
        .unwrap_or("127.0.0.1");
    let base_path = if config.base_path == "/" { "" } else { config.base_path.as_str() };
    println!("Read-only share for '{}' (expires {}):", share.session_name, share.expires_at);
    println!("  http://{host}:{}{base_path}/s/{}/", config.daemon_port, share.token);
    Ok(())
}

pub async fn list() -> Result<()> {
    let (_, client) = api_client()?;
    let shares = client.shares().await?;
    output::print_shares(&shares);
    Ok(())
}

pub async fn revoke(token: String) -> Result<()> {
    let (_, client) = api_client()?;
    client.delete_share(&token).await?;
    println!("Share revoked.");
    Ok(())
}
