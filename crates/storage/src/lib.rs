// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared state persistence for ttyd-mux.
//!
//! All daemon and CLI processes share a single JSON document (sessions,
//! shares, the daemon record, push subscriptions). Writers serialize
//! through an exclusive advisory file lock; readers always load fresh so
//! that concurrent processes stay consistent without an invalidation
//! protocol.
//!
//! Two implementations satisfy the same [`StateStore`] contract: the
//! file-backed [`FileStore`] used in production and the in-process
//! [`MemoryStore`] used by tests.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod doc;
mod file;
mod memory;

pub use doc::StateDoc;
pub use file::FileStore;
pub use memory::MemoryStore;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tmx_core::{DaemonRecord, PushSubscription, Session, Share};

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("timed out waiting for state lock at {0}")]
    LockTimeout(PathBuf),

    #[error("state IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no free port above {0}")]
    PortsExhausted(u16),
}

/// Capability set over the shared state document.
///
/// `load` and `with_doc` are the primitives; every typed accessor is a
/// provided method over them so both implementations behave identically.
/// `with_doc` runs a full read-modify-write transaction under the store's
/// exclusive lock; `load` returns a fresh copy and never caches across
/// calls.
pub trait StateStore: Send + Sync {
    /// Load a fresh copy of the document.
    fn load(&self) -> Result<StateDoc, StoreError>;

    /// Run a multi-step read-modify-write transaction under the lock.
    fn with_doc(&self, mutate: &mut dyn FnMut(&mut StateDoc)) -> Result<(), StoreError>;

    fn daemon(&self) -> Result<Option<DaemonRecord>, StoreError> {
        Ok(self.load()?.daemon)
    }

    fn set_daemon(&self, record: DaemonRecord) -> Result<(), StoreError> {
        self.with_doc(&mut |doc| doc.daemon = Some(record.clone()))
    }

    fn clear_daemon(&self) -> Result<(), StoreError> {
        self.with_doc(&mut |doc| doc.daemon = None)
    }

    fn sessions(&self) -> Result<Vec<Session>, StoreError> {
        Ok(self.load()?.sessions)
    }

    fn find_session(&self, name: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.load()?.sessions.into_iter().find(|s| s.name == name))
    }

    fn find_session_by_dir(&self, dir: &Path) -> Result<Option<Session>, StoreError> {
        Ok(self.load()?.sessions.into_iter().find(|s| s.dir == dir))
    }

    /// Upsert by name: any prior session with the same name is replaced.
    fn add_session(&self, session: Session) -> Result<(), StoreError> {
        self.with_doc(&mut |doc| doc.upsert_session(session.clone()))
    }

    fn remove_session(&self, name: &str) -> Result<bool, StoreError> {
        let mut removed = false;
        self.with_doc(&mut |doc| removed = doc.remove_session(name))?;
        Ok(removed)
    }

    fn shares(&self) -> Result<Vec<Share>, StoreError> {
        Ok(self.load()?.shares)
    }

    fn share(&self, token: &str) -> Result<Option<Share>, StoreError> {
        Ok(self.load()?.shares.into_iter().find(|s| s.token == token))
    }

    fn add_share(&self, share: Share) -> Result<(), StoreError> {
        self.with_doc(&mut |doc| doc.shares.push(share.clone()))
    }

    fn remove_share(&self, token: &str) -> Result<bool, StoreError> {
        let mut removed = false;
        self.with_doc(&mut |doc| removed = doc.remove_share(token))?;
        Ok(removed)
    }

    fn push_subscriptions(&self) -> Result<Vec<PushSubscription>, StoreError> {
        Ok(self.load()?.push_subscriptions)
    }

    fn add_push_subscription(&self, subscription: PushSubscription) -> Result<(), StoreError> {
        self.with_doc(&mut |doc| doc.push_subscriptions.push(subscription.clone()))
    }

    fn remove_push_subscription(&self, id: &str) -> Result<bool, StoreError> {
        let mut removed = false;
        self.with_doc(&mut |doc| {
            let before = doc.push_subscriptions.len();
            doc.push_subscriptions.retain(|s| s.id != id);
            removed = doc.push_subscriptions.len() != before;
        })?;
        Ok(removed)
    }

    /// Smallest port strictly above `base_port` not recorded by any session.
    fn next_port(&self, base_port: u16) -> Result<u16, StoreError> {
        let doc = self.load()?;
        let mut candidate = base_port;
        loop {
            candidate = candidate.checked_add(1).ok_or(StoreError::PortsExhausted(base_port))?;
            if !doc.sessions.iter().any(|s| s.port == candidate) {
                return Ok(candidate);
            }
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod store_tests;
