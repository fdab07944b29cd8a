// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn explicit_binary_override_wins() {
    std::env::set_var("TTYD_MUX_DAEMON_BINARY", "/opt/custom/ttyd-muxd");
    assert_eq!(daemon_binary(), PathBuf::from("/opt/custom/ttyd-muxd"));
    std::env::remove_var("TTYD_MUX_DAEMON_BINARY");
}

#[tokio::test]
#[serial]
async fn ensure_daemon_fails_fast_when_spawn_fails() {
    std::env::set_var("TTYD_MUX_DAEMON_BINARY", "/nonexistent/ttyd-muxd");
    let dir = tempfile::tempdir().unwrap();
    let err = ensure_daemon(&dir.path().join("ttyd-mux.sock")).await.unwrap_err();
    assert!(err.to_string().contains("No such file") || err.to_string().contains("os error"));
    std::env::remove_var("TTYD_MUX_DAEMON_BINARY");
}
