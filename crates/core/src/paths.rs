// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! URL-path helpers shared by the router, the supervisor, and the CLI.

/// Join two URL path fragments, collapsing duplicate slashes. The result
/// always begins with `/` and never ends with one (except the bare root).
pub fn join_url_path(base: &str, rest: &str) -> String {
    let mut joined = String::with_capacity(base.len() + rest.len() + 2);
    joined.push('/');
    for segment in base.split('/').chain(rest.split('/')) {
        if segment.is_empty() {
            continue;
        }
        if !joined.ends_with('/') {
            joined.push('/');
        }
        joined.push_str(segment);
    }
    joined
}

/// Whether a caller-supplied relative path stays inside its base once
/// joined. Rejects absolute paths, parent traversal (including the
/// percent-encoded spellings), NUL bytes, backslashes, and Windows drive
/// prefixes.
pub fn is_relative_path_safe(path: &str) -> bool {
    if path.is_empty() {
        return false;
    }
    if path.contains('\0') || path.contains('\\') {
        return false;
    }
    if path.starts_with('/') {
        return false;
    }
    // Windows drive prefix such as `C:`
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return false;
    }
    // Percent-encoded dots would decode into traversal downstream.
    let lowered = path.to_ascii_lowercase();
    if lowered.contains("%2e") || lowered.contains("%2f") || lowered.contains("%5c") {
        return false;
    }
    path.split('/').all(|segment| segment != "..")
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
