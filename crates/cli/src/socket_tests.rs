// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Fake daemon: answer one line per connection like the real control plane.
async fn fake_daemon(path: std::path::PathBuf) {
    let listener = tokio::net::UnixListener::bind(&path).unwrap();
    loop {
        let (stream, _) = listener.accept().await.unwrap();
        tokio::spawn(async move {
            let (reader, mut writer) = stream.into_split();
            let mut line = String::new();
            BufReader::new(reader).read_line(&mut line).await.unwrap();
            let reply = if line.trim() == "ping" { "pong" } else { "error: unknown command" };
            writer.write_all(reply.as_bytes()).await.unwrap();
            writer.write_all(b"\n").await.unwrap();
        });
    }
}

#[tokio::test]
async fn send_command_round_trips_one_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ttyd-mux.sock");
    tokio::spawn(fake_daemon(path.clone()));
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    assert_eq!(send_command(&path, "ping").await.unwrap(), "pong");
    assert!(ping(&path).await);
    assert_eq!(send_command(&path, "nope").await.unwrap(), "error: unknown command");
}

#[tokio::test]
async fn ping_is_false_without_a_daemon() {
    let dir = tempfile::tempdir().unwrap();
    assert!(!ping(&dir.path().join("missing.sock")).await);
}
