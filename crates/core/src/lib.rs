// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Core domain types for ttyd-mux.
//!
//! Value records persisted in the shared state document (sessions, shares,
//! the daemon record, push subscriptions), plus the small pure helpers the
//! daemon and CLI both need: session-name sanitization, share-token
//! generation, expiry parsing, URL-path joining, and configuration.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod clock;
mod config;
mod paths;
mod push;
mod session;
mod share;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, MuxConfig, ReloadReport, StateStoreKind};
pub use paths::{is_relative_path_safe, join_url_path};
pub use push::{PushKeys, PushSubscription};
pub use session::{
    is_reserved_name, sanitize_session_name, session_name_from_dir, DaemonRecord, Session,
};
pub use share::{generate_token, parse_expires_in, Share, DEFAULT_EXPIRY_MS, TOKEN_LEN};
