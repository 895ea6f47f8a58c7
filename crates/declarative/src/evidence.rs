//! Evidence sinks for audit trails
//!
//! Plans, apply results and drift reports are recorded under a label and
//! the sink reports where each document ended up.

use crate::error::{Error, Result};
use crate::persist::write_json_atomic;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Durable destination for audit documents
pub trait EvidenceSink {
    /// Where a document recorded under `label` ends up
    fn location(&self, label: &str) -> PathBuf;

    /// Write `document` under `label`, returning its location
    fn record(&self, label: &str, document: &Value) -> Result<PathBuf>;
}

/// Extension trait for recording any serializable document
pub trait EvidenceSinkExt {
    fn record_json<T: Serialize>(&self, label: &str, document: &T) -> Result<PathBuf>;
}

impl<S: EvidenceSink + ?Sized> EvidenceSinkExt for S {
    fn record_json<T: Serialize>(&self, label: &str, document: &T) -> Result<PathBuf> {
        let value =
            serde_json::to_value(document).map_err(|e| Error::json(self.location(label), e))?;
        self.record(label, &value)
    }
}

/// Sink writing `<dir>/<label>.json`
#[derive(Debug, Clone)]
pub struct DirEvidenceSink {
    dir: PathBuf,
}

impl DirEvidenceSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where a label is (or would be) written
    pub fn path_for(&self, label: &str) -> PathBuf {
        self.dir.join(format!("{label}.json"))
    }
}

impl EvidenceSink for DirEvidenceSink {
    fn location(&self, label: &str) -> PathBuf {
        self.path_for(label)
    }

    fn record(&self, label: &str, document: &Value) -> Result<PathBuf> {
        if label.is_empty() || label.contains(['/', '\\']) || label.starts_with('.') {
            return Err(Error::InvalidName {
                name: label.to_string(),
                reason: "evidence label must be a plain file stem",
            });
        }

        let path = self.path_for(label);
        write_json_atomic(&path, document)?;
        log::debug!("Recorded {label} evidence at {}", path.display());
        Ok(path)
    }
}

/// Sink keeping documents in memory
#[derive(Debug, Default)]
pub struct MemoryEvidenceSink {
    records: Mutex<Vec<(String, Value)>>,
}

impl MemoryEvidenceSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent document recorded under `label`
    pub fn latest(&self, label: &str) -> Option<Value> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|(l, _)| l == label)
            .map(|(_, doc)| doc.clone())
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EvidenceSink for MemoryEvidenceSink {
    fn location(&self, label: &str) -> PathBuf {
        PathBuf::from(format!("memory/{label}.json"))
    }

    fn record(&self, label: &str, document: &Value) -> Result<PathBuf> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((label.to_string(), document.clone()));
        Ok(self.location(label))
    }
}
