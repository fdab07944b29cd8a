// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The state document: one JSON object holding everything ttyd-mux
//! persists. Absent arrays mean empty; unknown top-level keys are carried
//! through round-trips untouched.

use serde::{Deserialize, Serialize};
use tmx_core::{DaemonRecord, PushSubscription, Session, Share};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daemon: Option<DaemonRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sessions: Vec<Session>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shares: Vec<Share>,

    #[serde(default, rename = "pushSubscriptions", skip_serializing_if = "Vec::is_empty")]
    pub push_subscriptions: Vec<PushSubscription>,

    /// Keys written by other tools or future versions; preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl StateDoc {
    /// Last-writer-wins upsert keyed by session name.
    pub fn upsert_session(&mut self, session: Session) {
        self.sessions.retain(|s| s.name != session.name);
        self.sessions.push(session);
    }

    pub fn remove_session(&mut self, name: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.name != name);
        self.sessions.len() != before
    }

    pub fn remove_share(&mut self, token: &str) -> bool {
        let before = self.shares.len();
        self.shares.retain(|s| s.token != token);
        self.shares.len() != before
    }
}

#[cfg(test)]
#[path = "doc_tests.rs"]
mod tests;
