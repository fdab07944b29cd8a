// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Share-token management.
//!
//! Shares are cryptographically random, time-bounded, revocable handles on
//! a live session. Expiry is enforced lazily: every validate/list sweeps
//! expired records out of the store. Shares whose session has since been
//! stopped stay recorded until expiry and simply fail to resolve.

use std::sync::Arc;

use thiserror::Error;
use tmx_core::{generate_token, parse_expires_in, Clock, Share, DEFAULT_EXPIRY_MS};
use tmx_storage::{StateStore, StoreError};
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct ShareManager {
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
}

impl ShareManager {
    pub fn new(store: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Create a share for a session that exists right now. `expires_in`
    /// accepts `Nh`/`Nm`/`Nd`; anything else means one hour.
    pub fn create_share(
        &self,
        session_name: &str,
        expires_in: Option<&str>,
    ) -> Result<Share, ShareError> {
        if self.store.find_session(session_name)?.is_none() {
            return Err(ShareError::SessionNotFound(session_name.to_string()));
        }

        let ttl_ms = expires_in.map(parse_expires_in).unwrap_or(DEFAULT_EXPIRY_MS);
        let now = self.clock.now();

        // Collisions are treated as impossible; retry anyway.
        let token = loop {
            let candidate = generate_token();
            if self.store.share(&candidate)?.is_none() {
                break candidate;
            }
        };

        let share = Share {
            token,
            session_name: session_name.to_string(),
            created_at: now,
            expires_at: now + chrono::Duration::milliseconds(ttl_ms as i64),
        };
        self.store.add_share(share.clone())?;
        info!(session = session_name, token = %truncated(&share.token), ttl_ms, "share created");
        Ok(share)
    }

    /// Look up a token. An expired share is removed as a side effect and
    /// reported as absent.
    pub fn validate_share(&self, token: &str) -> Result<Option<Share>, ShareError> {
        let Some(share) = self.store.share(token)? else {
            return Ok(None);
        };
        if share.is_expired(self.clock.now()) {
            debug!(token = %truncated(token), "share expired, sweeping");
            self.store.remove_share(token)?;
            return Ok(None);
        }
        Ok(Some(share))
    }

    /// Remove a token. True when a record was actually removed.
    pub fn revoke_share(&self, token: &str) -> Result<bool, ShareError> {
        let removed = self.store.remove_share(token)?;
        if removed {
            info!(token = %truncated(token), "share revoked");
        }
        Ok(removed)
    }

    /// All non-expired shares; expired ones are swept first.
    pub fn list_shares(&self) -> Result<Vec<Share>, ShareError> {
        self.cleanup_expired()?;
        Ok(self.store.shares()?)
    }

    /// Sweep every expired share. Returns how many were removed.
    pub fn cleanup_expired(&self) -> Result<usize, ShareError> {
        let now = self.clock.now();
        let mut removed = 0;
        self.store.with_doc(&mut |doc| {
            let before = doc.shares.len();
            doc.shares.retain(|s| !s.is_expired(now));
            removed = before - doc.shares.len();
        })?;
        if removed > 0 {
            debug!(removed, "swept expired shares");
        }
        Ok(removed)
    }
}

/// Tokens are credentials; log only a prefix.
fn truncated(token: &str) -> &str {
    &token[..token.len().min(8)]
}

#[cfg(test)]
#[path = "shares_tests.rs"]
mod tests;
