//! Backend abstraction for bucket storage.
//!
//! The [`Backend`] trait is the only surface the applier and the drift
//! detector use to touch real resources, allowing for different
//! implementations:
//! - [`LocalBackend`]: buckets as directories with a `metadata.json`
//! - [`MemoryBackend`]: in-process map with failure injection, for tests

pub mod local;
pub mod memory;

pub use local::LocalBackend;
pub use memory::{Call, MemoryBackend};

use crate::error::Result;
use crate::types::{Classification, Descriptor};

/// Storage operations consumed by reconciliation.
///
/// Calls are synchronous and block until complete. Implementations should
/// bound each call with their own timeout.
pub trait Backend: Send + Sync {
    /// Create the bucket or update its attributes.
    ///
    /// Must be idempotent and must merge with stored attributes, keeping
    /// anything not listed here (prefix policies in particular).
    fn ensure(&self, name: &str, public: bool, classification: Classification)
    -> Result<Descriptor>;

    /// Add `prefix` to the bucket's prefix policy set.
    ///
    /// Re-adding an existing prefix is a no-op.
    fn set_prefix_policy(&self, name: &str, prefix: &str) -> Result<Descriptor>;

    /// Current attributes, or `None` if the bucket does not exist.
    fn describe(&self, name: &str) -> Result<Option<Descriptor>>;

    /// Check if a bucket exists.
    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.describe(name)?.is_some())
    }
}
