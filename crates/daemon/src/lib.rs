// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ttyd-mux daemon library.
//!
//! The daemon owns the fleet of per-directory terminal backends: it
//! allocates ports and URL prefixes, spawns and reaps `ttyd` processes,
//! fronts them behind one HTTP listener (portal, control API, share links,
//! reverse proxy), and answers the CLI on a local control socket.
//!
//! The CLI crate links against this library for the control-socket
//! protocol, API payload types, and path resolution.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod control;
pub mod env;
pub mod http;
pub mod lifecycle;
pub mod ports;
pub mod proc;
pub mod resolver;
pub mod settings;
pub mod shares;
pub mod supervisor;

pub use settings::ConfigHandle;
pub use shares::{ShareError, ShareManager};
pub use supervisor::{
    SessionSupervisor, StartOptions, StopOptions, SupervisorError,
};
