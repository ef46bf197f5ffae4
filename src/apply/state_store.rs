// Copyright (c) 2025 - Cowboy AI, Inc.
//! Local Realized State
//!
//! Persists the [`RealizedState`] of the last apply in a state directory:
//!
//! ```text
//! <dir>/state.json          current state
//! <dir>/state.json.backup   state before the last save
//! <dir>/.lock               held while saving
//! <dir>/.cache/             executor scratch space
//! ```
//!
//! [`StateStore::clean`] removes all of it so the next run starts clean. It is
//! idempotent: cleaning a clean directory succeeds.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::errors::PlannerResult;

use super::RealizedState;

const STATE_FILE: &str = "state.json";
const BACKUP_FILE: &str = "state.json.backup";
const LOCK_FILE: &str = ".lock";
const CACHE_DIR: &str = ".cache";

/// State directory of one deployment
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    pub fn backup_path(&self) -> PathBuf {
        self.dir.join(BACKUP_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.dir.join(CACHE_DIR)
    }

    /// Persist `state`, keeping the previous state as backup
    ///
    /// Fails with `AlreadyExists` when another save holds the lock.
    pub async fn save(&self, state: &RealizedState) -> PlannerResult<()> {
        fs::create_dir_all(self.cache_dir()).await?;

        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.lock_path())
            .await?;

        let result = self.write_state(state).await;
        remove_file(&self.lock_path()).await?;
        result?;

        debug!(path = %self.state_path().display(), "State saved");
        Ok(())
    }

    async fn write_state(&self, state: &RealizedState) -> PlannerResult<()> {
        let json = serde_json::to_string_pretty(state)?;
        if fs::try_exists(self.state_path()).await? {
            fs::rename(self.state_path(), self.backup_path()).await?;
        }
        fs::write(self.state_path(), json).await?;
        Ok(())
    }

    /// Load the last saved state, if any
    pub async fn load(&self) -> PlannerResult<Option<RealizedState>> {
        match fs::read_to_string(self.state_path()).await {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove every local state artifact
    pub async fn clean(&self) -> PlannerResult<()> {
        remove_file(&self.state_path()).await?;
        remove_file(&self.backup_path()).await?;
        remove_file(&self.lock_path()).await?;

        match fs::remove_dir_all(self.cache_dir()).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        info!(dir = %self.dir.display(), "Local state cleaned");
        Ok(())
    }
}

async fn remove_file(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
