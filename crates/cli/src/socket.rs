// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-socket client: one line out, one line back.

use std::path::Path;

use tmx_daemon::control::protocol;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

/// Send one command line and return the response line.
pub async fn send_command(socket_path: &Path, command: &str) -> std::io::Result<String> {
    let mut stream = UnixStream::connect(socket_path).await?;
    stream.write_all(command.as_bytes()).await?;
    stream.write_all(b"\n").await?;

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).await?;
    Ok(line.trim().to_string())
}

/// Whether a daemon answers on the control socket.
pub async fn ping(socket_path: &Path) -> bool {
    matches!(send_command(socket_path, protocol::PING).await, Ok(response) if response == protocol::PONG)
}

#[cfg(test)]
#[path = "socket_tests.rs"]
mod tests;
