// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::Result;

use crate::output;

use super::api_client;

pub async fn run() -> Result<()> {
    let (_, client) = api_client()?;
    let status = client.status().await?;

    match status.daemon {
        Some(daemon) => {
            println!(
                "Daemon running (pid {}, port {}, since {})",
                daemon.pid,
                daemon.port,
                daemon.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            );
        }
        None => println!("Daemon record missing."),
    }
    println!();
    output::print_sessions(&status.sessions);
    Ok(())
}
