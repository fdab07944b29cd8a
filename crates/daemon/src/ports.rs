// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic next-free-port allocation.
//!
//! Candidates come from the state store (smallest port above the base not
//! recorded by any session); each candidate is then probed against the OS
//! so ports held by unrelated local processes are skipped too.

use std::sync::Arc;

use thiserror::Error;
use tmx_storage::{StateStore, StoreError};

use crate::proc::ProcessRunner;

/// Upper bound on the scan so a saturated host fails fast.
const SCAN_LIMIT: u16 = 1000;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("no free port within {SCAN_LIMIT} of base port {0}")]
    Exhausted(u16),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct PortAllocator;

impl PortAllocator {
    /// Smallest port above `base_port` that is neither recorded by a
    /// session nor currently bound by another local process.
    pub fn allocate(
        store: &Arc<dyn StateStore>,
        runner: &Arc<dyn ProcessRunner>,
        base_port: u16,
    ) -> Result<u16, PortError> {
        let mut candidate = base_port;
        loop {
            candidate = match store.next_port(candidate) {
                Ok(port) => port,
                Err(StoreError::PortsExhausted(_)) => return Err(PortError::Exhausted(base_port)),
                Err(e) => return Err(e.into()),
            };
            if candidate.saturating_sub(base_port) > SCAN_LIMIT {
                return Err(PortError::Exhausted(base_port));
            }
            if runner.is_port_available(candidate) {
                return Ok(candidate);
            }
        }
    }
}

#[cfg(test)]
#[path = "ports_tests.rs"]
mod tests;
