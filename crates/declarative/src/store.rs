//! State document persistence
//!
//! Only the state document survives between runs. Loading never fails on
//! absence: a missing file yields a fresh version-1 document so a domain
//! can bootstrap from nothing.
//!
//! Saves are read-modify-write with no version check. Concurrent applies
//! against the same store must be serialized by the caller.

use crate::error::Result;
use crate::persist::{read_json, write_json_atomic};
use crate::types::StateDocument;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Durable storage for the last reconciled state
pub trait StateStore {
    /// Load the state document, or an empty one if none exists yet
    fn load(&self) -> Result<StateDocument>;

    /// Persist the state document
    fn save(&self, state: &StateDocument) -> Result<()>;
}

/// State store backed by a pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> Result<StateDocument> {
        match read_json::<StateDocument>(&self.path)? {
            Some(state) => {
                state.validate()?;
                log::debug!(
                    "Loaded state v{} with {} resources from {}",
                    state.version,
                    state.resources.len(),
                    self.path.display()
                );
                Ok(state)
            }
            None => {
                log::debug!(
                    "State file {} does not exist, using empty state",
                    self.path.display()
                );
                Ok(StateDocument::default())
            }
        }
    }

    fn save(&self, state: &StateDocument) -> Result<()> {
        write_json_atomic(&self.path, state)?;
        log::debug!("Saved state to {}", self.path.display());
        Ok(())
    }
}

/// State store held in memory
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<Option<StateDocument>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<StateDocument> {
        let guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.clone().unwrap_or_default())
    }

    fn save(&self, state: &StateDocument) -> Result<()> {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(state.clone());
        Ok(())
    }
}
