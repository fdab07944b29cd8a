// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed state store.
//!
//! Writers hold an exclusive advisory lock for the whole read-modify-write
//! transaction, so concurrent CLI invocations and the daemon never corrupt
//! the document. The lock lives on a sidecar file (`state.json.lock`)
//! because the document itself is replaced by rename on every write and a
//! lock on a renamed-away inode would no longer exclude anyone.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;
use tracing::warn;

use crate::{StateDoc, StateStore, StoreError};

/// How long a caller waits for the advisory lock before giving up.
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll interval while waiting for the lock.
const LOCK_RETRY: Duration = Duration::from_millis(10);

pub struct FileStore {
    state_path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl FileStore {
    /// Store rooted at `state_dir`, using `state.json` + `state.json.lock`.
    pub fn new(state_dir: &Path) -> Self {
        let state_path = state_dir.join("state.json");
        let lock_path = state_dir.join("state.json.lock");
        Self { state_path, lock_path, lock_timeout: LOCK_TIMEOUT }
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    #[cfg(test)]
    pub(crate) fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Acquire the exclusive advisory lock, retrying until the deadline.
    /// The lock is released when the returned handle drops.
    fn acquire_lock(&self) -> Result<File, StoreError> {
        if let Some(parent) = self.lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)?;

        let deadline = Instant::now() + self.lock_timeout;
        loop {
            match lock_file.try_lock_exclusive() {
                Ok(()) => return Ok(lock_file),
                Err(_) if Instant::now() < deadline => {
                    std::thread::sleep(LOCK_RETRY);
                }
                Err(_) => return Err(StoreError::LockTimeout(self.lock_path.clone())),
            }
        }
    }

    /// Read and parse the document. A missing, unreadable, or corrupt file
    /// collapses to the empty document (logged, not fatal).
    fn read_doc(&self) -> StateDoc {
        let raw = match std::fs::read(&self.state_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return StateDoc::default(),
            Err(e) => {
                warn!(path = %self.state_path.display(), error = %e, "failed to read state file, treating as empty");
                return StateDoc::default();
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %self.state_path.display(), error = %e, "failed to parse state file, treating as empty");
                StateDoc::default()
            }
        }
    }

    /// Write via sibling temp file + rename so readers never see a torn
    /// document.
    fn write_doc(&self, doc: &StateDoc) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(doc)?;
        let tmp_path = self.state_path.with_extension(format!("tmp.{}", std::process::id()));
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(&json)?;
            tmp.sync_all()?;
        }
        if let Err(e) = std::fs::rename(&tmp_path, &self.state_path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(StoreError::Io(e));
        }
        Ok(())
    }
}

impl StateStore for FileStore {
    fn load(&self) -> Result<StateDoc, StoreError> {
        let _lock = self.acquire_lock()?;
        Ok(self.read_doc())
    }

    fn with_doc(&self, mutate: &mut dyn FnMut(&mut StateDoc)) -> Result<(), StoreError> {
        let _lock = self.acquire_lock()?;
        let mut doc = self.read_doc();
        mutate(&mut doc);
        self.write_doc(&doc)
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
