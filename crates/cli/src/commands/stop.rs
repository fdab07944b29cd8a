// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::Result;

use super::api_client;

pub async fn run(name: String, kill_tmux: bool) -> Result<()> {
    let (_, client) = api_client()?;
    client.delete_session(&name, kill_tmux).await?;
    println!("Session '{name}' stopped.");
    Ok(())
}
