// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;

fn session(name: &str, port: u16) -> Session {
    Session {
        name: name.to_string(),
        pid: 1,
        port,
        path: format!("/{name}"),
        dir: "/tmp".into(),
        started_at: Utc::now(),
    }
}

#[test]
fn empty_doc_serializes_to_empty_object() {
    let json = serde_json::to_string(&StateDoc::default()).unwrap();
    assert_eq!(json, "{}");
}

#[test]
fn absent_arrays_deserialize_as_empty() {
    let doc: StateDoc = serde_json::from_str(r#"{"daemon":null}"#).unwrap();
    assert!(doc.daemon.is_none());
    assert!(doc.sessions.is_empty());
    assert!(doc.shares.is_empty());
    assert!(doc.push_subscriptions.is_empty());
}

#[test]
fn unknown_keys_survive_a_round_trip() {
    let raw = r#"{"sessions":[],"portalTheme":"dark","nested":{"a":1}}"#;
    let doc: StateDoc = serde_json::from_str(raw).unwrap();
    let back = serde_json::to_value(&doc).unwrap();
    assert_eq!(back["portalTheme"], "dark");
    assert_eq!(back["nested"]["a"], 1);
}

#[test]
fn upsert_replaces_by_name() {
    let mut doc = StateDoc::default();
    doc.upsert_session(session("demo", 7601));
    doc.upsert_session(session("demo", 7605));
    assert_eq!(doc.sessions.len(), 1);
    assert_eq!(doc.sessions[0].port, 7605);
}

#[test]
fn remove_reports_whether_anything_went() {
    let mut doc = StateDoc::default();
    doc.upsert_session(session("demo", 7601));
    assert!(doc.remove_session("demo"));
    assert!(!doc.remove_session("demo"));
}

#[test]
fn push_subscriptions_use_camel_case_key() {
    let sub = tmx_core::PushSubscription {
        id: "p1".into(),
        endpoint: "https://push.example".into(),
        keys: tmx_core::PushKeys { p256dh: "x".into(), auth: "y".into() },
        session_name: Some("demo".into()),
        created_at: Utc::now(),
    };
    let doc = StateDoc { push_subscriptions: vec![sub], ..Default::default() };
    let value = serde_json::to_value(&doc).unwrap();
    assert!(value.get("pushSubscriptions").is_some());
    assert_eq!(value["pushSubscriptions"][0]["sessionName"], "demo");
}
