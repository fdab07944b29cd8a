// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    plain = { "demo", "demo" },
    spaces_and_bang = { "weird name!", "weird_name_" },
    dots_dashes_kept = { "my.proj-v2", "my.proj-v2" },
    unicode = { "café", "caf_" },
    slashes = { "a/b", "a_b" },
)]
fn sanitize_replaces_offending_runes(input: &str, expected: &str) {
    assert_eq!(sanitize_session_name(input), expected);
}

#[parameterized(
    api = { "api", true },
    s = { "s", true },
    share = { "share", true },
    sample = { "sample", false },
    share_like = { "share-docs", false },
    apiary = { "apiary", false },
)]
fn reserved_names_match_whole_segments(name: &str, reserved: bool) {
    assert_eq!(is_reserved_name(name), reserved);
}

#[test]
fn name_from_dir_uses_last_component() {
    assert_eq!(session_name_from_dir(std::path::Path::new("/home/me/my proj")), "my_proj");
}

#[test]
fn name_from_dir_falls_back_for_root() {
    assert_eq!(session_name_from_dir(std::path::Path::new("/")), "session");
}

#[test]
fn session_full_path_joins_base() {
    let s = Session {
        name: "demo".into(),
        pid: 42,
        port: 7601,
        path: "/demo".into(),
        dir: "/tmp".into(),
        started_at: chrono::Utc::now(),
    };
    assert_eq!(s.full_path("/ttyd-mux"), "/ttyd-mux/demo");
}

#[test]
fn session_round_trips_through_json() {
    let s = Session {
        name: "demo".into(),
        pid: 42,
        port: 7601,
        path: "/demo".into(),
        dir: "/tmp".into(),
        started_at: chrono::Utc::now(),
    };
    let json = serde_json::to_string(&s).unwrap();
    assert!(json.contains("\"started_at\""));
    let back: Session = serde_json::from_str(&json).unwrap();
    assert_eq!(back, s);
}
