// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lookup by name, directory, or URL path prefix.
//!
//! Path resolution is longest-prefix: a request path matches a session when
//! it equals the session's full prefix (base path + session path) or
//! continues past it with a `/`. Callers feed in liveness-filtered
//! sessions, so a match is always proxyable.

use std::path::Path;

use tmx_core::Session;

/// A session matched by URL prefix, plus the path remainder after the
/// prefix (empty or beginning with `/`).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSession {
    pub session: Session,
    pub rest: String,
}

pub fn find_by_name<'a>(sessions: &'a [Session], name: &str) -> Option<&'a Session> {
    sessions.iter().find(|s| s.name == name)
}

pub fn find_by_dir<'a>(sessions: &'a [Session], dir: &Path) -> Option<&'a Session> {
    sessions.iter().find(|s| s.dir == dir)
}

/// Longest-prefix match of `request_path` against each session's full URL
/// prefix under `base_path`.
pub fn resolve_by_path(
    sessions: &[Session],
    base_path: &str,
    request_path: &str,
) -> Option<ResolvedSession> {
    let mut best: Option<(usize, ResolvedSession)> = None;
    for session in sessions {
        let full = session.full_path(base_path);
        let matches = request_path == full
            || (request_path.starts_with(&full)
                && request_path.as_bytes().get(full.len()) == Some(&b'/'));
        if !matches {
            continue;
        }
        if best.as_ref().is_some_and(|(len, _)| *len >= full.len()) {
            continue;
        }
        let rest = request_path[full.len()..].to_string();
        best = Some((full.len(), ResolvedSession { session: session.clone(), rest }));
    }
    best.map(|(_, resolved)| resolved)
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
