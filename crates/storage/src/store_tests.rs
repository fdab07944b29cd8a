// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Contract tests run against both store implementations, plus the
//! uniqueness properties of the session set.

use chrono::Utc;
use proptest::prelude::*;
use tmx_core::{DaemonRecord, PushKeys, PushSubscription, Session, Share};

use crate::{FileStore, MemoryStore, StateStore};

fn session(name: &str, port: u16) -> Session {
    Session {
        name: name.to_string(),
        pid: 1000 + u32::from(port),
        port,
        path: format!("/{name}"),
        dir: std::path::PathBuf::from("/tmp").join(name),
        started_at: Utc::now(),
    }
}

fn share(token: &str, session_name: &str) -> Share {
    let now = Utc::now();
    Share {
        token: token.to_string(),
        session_name: session_name.to_string(),
        created_at: now,
        expires_at: now + chrono::Duration::hours(1),
    }
}

fn contract_suite(store: &dyn StateStore) {
    // daemon record
    assert!(store.daemon().unwrap().is_none());
    let record = DaemonRecord { pid: 4242, port: 7680, started_at: Utc::now() };
    store.set_daemon(record.clone()).unwrap();
    assert_eq!(store.daemon().unwrap(), Some(record));
    store.clear_daemon().unwrap();
    assert!(store.daemon().unwrap().is_none());

    // sessions: upsert by name
    store.add_session(session("demo", 7601)).unwrap();
    store.add_session(session("other", 7602)).unwrap();
    store.add_session(session("demo", 7603)).unwrap();
    let sessions = store.sessions().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(store.find_session("demo").unwrap().unwrap().port, 7603);
    assert_eq!(
        store.find_session_by_dir(std::path::Path::new("/tmp/other")).unwrap().unwrap().name,
        "other"
    );
    assert!(store.remove_session("demo").unwrap());
    assert!(!store.remove_session("demo").unwrap());

    // next_port skips recorded ports
    assert_eq!(store.next_port(7600).unwrap(), 7601);
    store.add_session(session("third", 7601)).unwrap();
    assert_eq!(store.next_port(7600).unwrap(), 7603);

    // shares
    store.add_share(share("aa".repeat(16).as_str(), "other")).unwrap();
    assert!(store.share(&"aa".repeat(16)).unwrap().is_some());
    assert!(store.share("missing").unwrap().is_none());
    assert!(store.remove_share(&"aa".repeat(16)).unwrap());
    assert!(!store.remove_share(&"aa".repeat(16)).unwrap());

    // push subscriptions
    let sub = PushSubscription {
        id: "sub-1".into(),
        endpoint: "https://push.example/ep".into(),
        keys: PushKeys { p256dh: "k".into(), auth: "a".into() },
        session_name: None,
        created_at: Utc::now(),
    };
    store.add_push_subscription(sub).unwrap();
    assert_eq!(store.push_subscriptions().unwrap().len(), 1);
    assert!(store.remove_push_subscription("sub-1").unwrap());
    assert!(!store.remove_push_subscription("sub-1").unwrap());
}

#[test]
fn memory_store_satisfies_the_contract() {
    contract_suite(&MemoryStore::new());
}

#[test]
fn file_store_satisfies_the_contract() {
    let dir = tempfile::tempdir().unwrap();
    contract_suite(&FileStore::new(dir.path()));
}

/// Operations applied in a property run.
#[derive(Debug, Clone)]
enum Op {
    Add(u8, u16),
    Remove(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..8, 7601u16..7650).prop_map(|(n, p)| Op::Add(n, p)),
        (0u8..8).prop_map(Op::Remove),
    ]
}

proptest! {
    /// Any sequence of add/remove keeps name, port, and path unique, and
    /// next_port never returns a port in use.
    #[test]
    fn session_set_stays_unique(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let store = MemoryStore::new();
        for op in ops {
            match op {
                Op::Add(n, port) => {
                    let name = format!("s{n}");
                    // mimic the supervisor: allocate through the store when
                    // the requested port is taken
                    let port = if store.sessions().unwrap().iter().any(|s| s.port == port) {
                        store.next_port(port).unwrap()
                    } else {
                        port
                    };
                    store.add_session(session(&name, port)).unwrap();
                }
                Op::Remove(n) => {
                    let _ = store.remove_session(&format!("s{n}")).unwrap();
                }
            }
            let sessions = store.sessions().unwrap();
            let mut names: Vec<_> = sessions.iter().map(|s| &s.name).collect();
            let mut ports: Vec<_> = sessions.iter().map(|s| s.port).collect();
            let mut paths: Vec<_> = sessions.iter().map(|s| &s.path).collect();
            names.sort();
            ports.sort_unstable();
            paths.sort();
            names.dedup();
            ports.dedup();
            paths.dedup();
            prop_assert_eq!(names.len(), sessions.len());
            prop_assert_eq!(ports.len(), sessions.len());
            prop_assert_eq!(paths.len(), sessions.len());

            let next = store.next_port(7600).unwrap();
            prop_assert!(!sessions.iter().any(|s| s.port == next));
        }
    }
}
