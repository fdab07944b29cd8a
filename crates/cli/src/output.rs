// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Table output for list-style commands.

use tmx_core::Share;
use tmx_daemon::http::api::SessionResponse;

pub fn print_sessions(sessions: &[SessionResponse]) {
    if sessions.is_empty() {
        println!("No active sessions.");
        return;
    }
    println!("{:<20} {:<8} {:<6} {:<24} {}", "NAME", "PID", "PORT", "PATH", "DIR");
    for entry in sessions {
        println!(
            "{:<20} {:<8} {:<6} {:<24} {}",
            entry.session.name,
            entry.session.pid,
            entry.session.port,
            entry.full_path,
            entry.session.dir.display(),
        );
    }
}

pub fn print_shares(shares: &[Share]) {
    if shares.is_empty() {
        println!("No active shares.");
        return;
    }
    println!("{:<34} {:<20} {}", "TOKEN", "SESSION", "EXPIRES");
    for share in shares {
        println!(
            "{:<34} {:<20} {}",
            share.token,
            share.session_name,
            share.expires_at.format("%Y-%m-%d %H:%M:%S UTC"),
        );
    }
}
