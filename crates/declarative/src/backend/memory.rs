//! In-memory backend for tests and embedding.
//!
//! Behaves like the local backend (merge on ensure, set semantics for
//! prefixes) and additionally records every call and can be told to fail a
//! given operation for a given bucket.

use super::Backend;
use crate::error::{Error, Operation, Result};
use crate::types::{Classification, Descriptor};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A backend call, as recorded by [`MemoryBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Ensure {
        name: String,
        public: bool,
        classification: Classification,
    },
    SetPrefixPolicy {
        name: String,
        prefix: String,
    },
    Describe {
        name: String,
    },
}

impl Call {
    /// Whether the call can change backend contents
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Describe { .. })
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    buckets: Mutex<BTreeMap<String, Descriptor>>,
    failures: Mutex<HashSet<(Operation, String)>>,
    calls: Mutex<Vec<Call>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a bucket without recording a call
    pub fn with_bucket(self, descriptor: Descriptor) -> Self {
        lock(&self.buckets).insert(descriptor.name.clone(), descriptor);
        self
    }

    /// Make `operation` on `name` fail from now on
    pub fn fail_on(&self, operation: Operation, name: &str) {
        lock(&self.failures).insert((operation, name.to_string()));
    }

    /// Change a bucket behind reconciliation's back
    pub fn modify<F>(&self, name: &str, f: F) -> bool
    where
        F: FnOnce(&mut Descriptor),
    {
        match lock(&self.buckets).get_mut(name) {
            Some(descriptor) => {
                f(descriptor);
                true
            }
            None => false,
        }
    }

    /// Delete a bucket behind reconciliation's back
    pub fn remove(&self, name: &str) -> Option<Descriptor> {
        lock(&self.buckets).remove(name)
    }

    /// Snapshot of a bucket without recording a call
    pub fn get(&self, name: &str) -> Option<Descriptor> {
        lock(&self.buckets).get(name).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.buckets).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.buckets).is_empty()
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    /// Calls that could have changed contents
    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn record(&self, call: Call) {
        lock(&self.calls).push(call);
    }

    fn check_failure(&self, operation: Operation, name: &str) -> Result<()> {
        if lock(&self.failures).contains(&(operation, name.to_string())) {
            return Err(Error::Rejected {
                message: format!("injected {operation} failure for '{name}'"),
            });
        }
        Ok(())
    }
}

impl Backend for MemoryBackend {
    fn ensure(
        &self,
        name: &str,
        public: bool,
        classification: Classification,
    ) -> Result<Descriptor> {
        self.record(Call::Ensure {
            name: name.to_string(),
            public,
            classification,
        });
        self.check_failure(Operation::Ensure, name)?;

        let mut buckets = lock(&self.buckets);
        let descriptor = buckets
            .entry(name.to_string())
            .or_insert_with(|| Descriptor::new(name, public, classification));
        descriptor.public = public;
        descriptor.classification = classification;
        descriptor.encrypted = true;
        Ok(descriptor.clone())
    }

    fn set_prefix_policy(&self, name: &str, prefix: &str) -> Result<Descriptor> {
        self.record(Call::SetPrefixPolicy {
            name: name.to_string(),
            prefix: prefix.to_string(),
        });
        self.check_failure(Operation::SetPrefixPolicy, name)?;

        let mut buckets = lock(&self.buckets);
        let descriptor = buckets.get_mut(name).ok_or_else(|| Error::BucketNotFound {
            name: name.to_string(),
        })?;
        descriptor.prefix_policies.insert(prefix.to_string());
        Ok(descriptor.clone())
    }

    fn describe(&self, name: &str) -> Result<Option<Descriptor>> {
        self.record(Call::Describe {
            name: name.to_string(),
        });
        self.check_failure(Operation::Describe, name)?;
        Ok(self.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_merges_existing() {
        let backend = MemoryBackend::new();
        backend.ensure("a", false, Classification::Internal).unwrap();
        backend.set_prefix_policy("a", "x/").unwrap();
        let desc = backend.ensure("a", true, Classification::Public).unwrap();

        assert!(desc.public);
        assert!(desc.prefix_policies.contains("x/"));
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_failure_injection() {
        let backend = MemoryBackend::new();
        backend.fail_on(Operation::Ensure, "bad");

        assert!(backend.ensure("good", false, Classification::Internal).is_ok());
        let err = backend
            .ensure("bad", false, Classification::Internal)
            .unwrap_err();
        assert!(matches!(err, Error::Rejected { .. }));
        assert!(backend.get("bad").is_none());
    }

    #[test]
    fn test_calls_are_recorded() {
        let backend = MemoryBackend::new();
        backend.describe("a").unwrap();
        backend.ensure("a", false, Classification::Internal).unwrap();

        assert_eq!(backend.calls().len(), 2);
        assert_eq!(backend.mutations().len(), 1);
        backend.clear_calls();
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_out_of_band_changes() {
        let backend = MemoryBackend::new()
            .with_bucket(Descriptor::new("a", false, Classification::Internal));
        assert!(backend.modify("a", |d| d.public = true));
        assert!(backend.get("a").unwrap().public);
        assert!(backend.remove("a").is_some());
        assert!(backend.describe("a").unwrap().is_none());
    }
}
