// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command implementations.

pub mod daemon;
pub mod list;
pub mod share;
pub mod start;
pub mod status;
pub mod stop;

use anyhow::Result;
use tmx_core::MuxConfig;

use crate::client::ApiClient;

/// Load the user config and build an API client from it.
pub(crate) fn api_client() -> Result<(MuxConfig, ApiClient)> {
    let config = MuxConfig::load(&MuxConfig::default_path())?;
    let client = ApiClient::new(&config);
    Ok((config, client))
}
