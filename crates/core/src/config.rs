// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration.
//!
//! Loaded from a TOML file at `$TTYD_MUX_CONFIG`, else
//! `<config dir>/ttyd-mux/config.toml`. A missing file yields the defaults.
//! Listener topology (`daemon_port`, `base_path`, `base_port`,
//! `listen_addresses`, `listen_sockets`) requires a restart; everything
//! else is hot-applied on `reload`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config at {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("base_path must start with '/': {0}")]
    BadBasePath(String),
}

/// Which state-store implementation the daemon runs on. Both satisfy the
/// same contract; `memory` gives an ephemeral daemon whose state dies with
/// the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateStoreKind {
    #[default]
    File,
    Memory,
}

/// Configuration consumed by the daemon core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MuxConfig {
    /// URL prefix under which the daemon exposes everything.
    pub base_path: String,
    /// First port considered when allocating a backend port.
    pub base_port: u16,
    /// Port of the daemon's public HTTP listener.
    pub daemon_port: u16,
    /// TCP bind addresses for the public listener.
    pub listen_addresses: Vec<String>,
    /// Additional Unix socket paths serving the same HTTP surface.
    pub listen_sockets: Vec<PathBuf>,
    /// State-store implementation backing the daemon.
    pub state_store: StateStoreKind,
    /// How long to wait for a spawned backend to bind its port.
    pub start_timeout_ms: u64,
    /// Whether the HTML interception hook runs on proxied responses.
    pub inject_html: bool,
    /// Whether the hook also runs on share (read-only) traffic.
    pub share_inject_html: bool,
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self {
            base_path: "/ttyd-mux".to_string(),
            base_port: 7600,
            daemon_port: 7680,
            listen_addresses: vec!["127.0.0.1".to_string()],
            listen_sockets: Vec::new(),
            state_store: StateStoreKind::File,
            start_timeout_ms: 5000,
            inject_html: true,
            share_inject_html: true,
        }
    }
}

/// Result of a `reload`: which keys changed and took effect, and which
/// changed but need a daemon restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadReport {
    pub hot_applied: Vec<String>,
    pub requires_restart: Vec<String>,
}

impl MuxConfig {
    /// Resolve the config file path: `$TTYD_MUX_CONFIG` wins, else the
    /// user config directory.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("TTYD_MUX_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ttyd-mux")
            .join("config.toml")
    }

    /// Load configuration from `path`. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Read(path.to_path_buf(), e)),
        };
        let config: Self =
            toml::from_str(&raw).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()
    }

    fn validate(mut self) -> Result<Self, ConfigError> {
        if !self.base_path.starts_with('/') {
            return Err(ConfigError::BadBasePath(self.base_path));
        }
        // Normalize away a trailing slash so prefix matching stays uniform.
        while self.base_path.len() > 1 && self.base_path.ends_with('/') {
            self.base_path.pop();
        }
        Ok(self)
    }

    /// Compare against a freshly loaded config, classifying every changed
    /// key as hot-applied or restart-required.
    pub fn diff_reload(&self, next: &Self) -> ReloadReport {
        let mut report = ReloadReport::default();
        let mut restart = |key: &str| report.requires_restart.push(key.to_string());

        if self.base_path != next.base_path {
            restart("base_path");
        }
        if self.base_port != next.base_port {
            restart("base_port");
        }
        if self.daemon_port != next.daemon_port {
            restart("daemon_port");
        }
        if self.listen_addresses != next.listen_addresses {
            restart("listen_addresses");
        }
        if self.listen_sockets != next.listen_sockets {
            restart("listen_sockets");
        }
        if self.state_store != next.state_store {
            restart("state_store");
        }

        let mut hot = |key: &str| report.hot_applied.push(key.to_string());
        if self.start_timeout_ms != next.start_timeout_ms {
            hot("start_timeout_ms");
        }
        if self.inject_html != next.inject_html {
            hot("inject_html");
        }
        if self.share_inject_html != next.share_inject_html {
            hot("share_inject_html");
        }
        report
    }

    /// Merge the hot-applicable keys of `next` into a copy of `self`,
    /// leaving restart-required keys untouched.
    pub fn apply_hot(&self, next: &Self) -> Self {
        Self {
            start_timeout_ms: next.start_timeout_ms,
            inject_html: next.inject_html,
            share_inject_html: next.share_inject_html,
            ..self.clone()
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
