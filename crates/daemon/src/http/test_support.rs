// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixtures shared by the HTTP-layer tests.

use std::sync::Arc;

use tmx_core::{FakeClock, MuxConfig};
use tmx_storage::{MemoryStore, StateStore};

use crate::lifecycle::ShutdownSignal;
use crate::proc::mock::MockRunner;
use crate::proc::ProcessRunner;
use crate::settings::ConfigHandle;
use crate::shares::ShareManager;
use crate::supervisor::{SessionSupervisor, TtydBackend};

use super::proxy::HttpProxy;
use super::AppState;

pub(crate) struct TestApp {
    pub state: AppState,
    pub runner: Arc<MockRunner>,
    pub clock: FakeClock,
}

pub(crate) fn test_app() -> TestApp {
    test_app_with_config(MuxConfig::default())
}

pub(crate) fn test_app_with_config(config: MuxConfig) -> TestApp {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let runner = Arc::new(MockRunner::new());
    let clock = FakeClock::new();
    let config =
        ConfigHandle::new(config, std::path::PathBuf::from("/nonexistent/config.toml"));

    let supervisor = Arc::new(SessionSupervisor::new(
        Arc::clone(&store),
        Arc::clone(&runner) as Arc<dyn ProcessRunner>,
        Arc::new(TtydBackend),
        Arc::new(clock.clone()),
        config.clone(),
    ));
    let shares = Arc::new(ShareManager::new(Arc::clone(&store), Arc::new(clock.clone())));

    let state = AppState {
        store,
        supervisor,
        shares,
        clock: Arc::new(clock.clone()),
        config,
        shutdown: Arc::new(ShutdownSignal::new()),
        proxy: HttpProxy::new(None),
    };
    TestApp { state, runner, clock }
}
