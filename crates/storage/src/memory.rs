// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process state store satisfying the same contract as [`FileStore`].
//! Used by unit tests and selectable by configuration for ephemeral runs.

use parking_lot::Mutex;

use crate::{StateDoc, StateStore, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    doc: Mutex<StateDoc>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<StateDoc, StoreError> {
        Ok(self.doc.lock().clone())
    }

    fn with_doc(&self, mutate: &mut dyn FnMut(&mut StateDoc)) -> Result<(), StoreError> {
        mutate(&mut self.doc.lock());
        Ok(())
    }
}
