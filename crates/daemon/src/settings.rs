// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-scoped configuration holder.
//!
//! Owned by the composition root and handed to components at construction;
//! each request reads a fresh snapshot so hot-reloaded keys take effect
//! without restarting. Listener topology changes are reported back to the
//! caller as restart-required.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tmx_core::{ConfigError, MuxConfig, ReloadReport};
use tracing::info;

#[derive(Clone)]
pub struct ConfigHandle {
    current: Arc<RwLock<Arc<MuxConfig>>>,
    path: Arc<PathBuf>,
}

impl ConfigHandle {
    pub fn new(config: MuxConfig, path: PathBuf) -> Self {
        Self { current: Arc::new(RwLock::new(Arc::new(config))), path: Arc::new(path) }
    }

    /// Snapshot of the current configuration.
    pub fn current(&self) -> Arc<MuxConfig> {
        Arc::clone(&self.current.read())
    }

    /// Re-read the config file, hot-apply what can be, and report the rest.
    pub fn reload(&self) -> Result<ReloadReport, ConfigError> {
        let next = MuxConfig::load(&self.path)?;
        let current = self.current();
        let report = current.diff_reload(&next);
        if !report.hot_applied.is_empty() {
            *self.current.write() = Arc::new(current.apply_hot(&next));
        }
        info!(
            hot = ?report.hot_applied,
            restart = ?report.requires_restart,
            "configuration reloaded"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
