// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session and daemon records.
//!
//! Both are small value records stored verbatim in the state document. A
//! `Session` describes one supervised backend terminal process; the
//! `DaemonRecord` marks a running daemon and is discarded when its pid is
//! no longer alive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One backend terminal process plus its metadata record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Stable identifier, unique across sessions. Safe as a tmux label.
    pub name: String,
    /// OS process id of the backend; authoritative only while alive.
    pub pid: u32,
    /// Loopback TCP port the backend listens on; unique among sessions.
    pub port: u16,
    /// URL sub-path under the base path, beginning with `/`.
    pub path: String,
    /// Working directory the backend was spawned in.
    pub dir: PathBuf,
    pub started_at: DateTime<Utc>,
}

impl Session {
    /// Full URL prefix for this session under the given base path.
    pub fn full_path(&self, base_path: &str) -> String {
        crate::join_url_path(base_path, &self.path)
    }
}

/// Record of the running daemon. Present while a daemon is up; cleared on
/// clean shutdown and discarded on revalidation when the pid is gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonRecord {
    pub pid: u32,
    pub port: u16,
    pub started_at: DateTime<Utc>,
}

/// Replace every rune outside `[A-Za-z0-9._-]` with `_` so the name is safe
/// as a shell argument and tmux session label.
pub fn sanitize_session_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect()
}

/// Names that would collide with router prefixes. URL prefixes collide only
/// on whole path segments, so exact matches are the reserved set.
pub fn is_reserved_name(name: &str) -> bool {
    matches!(name, "api" | "s" | "share")
}

/// Default session name for a directory: its sanitized last component.
pub fn session_name_from_dir(dir: &std::path::Path) -> String {
    let component = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = sanitize_session_name(&component);
    if name.is_empty() {
        "session".to_string()
    } else {
        name
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
