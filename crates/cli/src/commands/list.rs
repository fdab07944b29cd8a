// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::Result;

use crate::output;

use super::api_client;

pub async fn run() -> Result<()> {
    let (_, client) = api_client()?;
    let sessions = client.sessions().await?;
    output::print_sessions(&sessions);
    Ok(())
}
