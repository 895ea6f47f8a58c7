//! # Declarative
//!
//! Reconciliation of declared buckets against a storage backend.
//!
//! This crate compares a desired configuration with the last recorded state,
//! applies the difference to a backend, and later detects divergence between
//! the recorded state and what the backend actually holds.
//!
//! ## Core Concepts
//!
//! - **DesiredConfig**: the operator's declared buckets
//! - **StateDocument**: what was last reconciled; only apply advances it
//! - **Plan**: creates and updates, computed purely from the two above
//! - **DriftReport**: recorded state versus live backend attributes
//!
//! Nothing is ever deleted. A bucket that disappears from the desired
//! configuration is left alone by both the planner and the applier.
//!
//! ## Example
//!
//! ```
//! use declarative::{
//!     Classification, DesiredBucket, DesiredConfig, MemoryBackend, StateDocument,
//!     apply, detect, plan,
//! };
//!
//! let backend = MemoryBackend::new();
//! let desired = DesiredConfig::new(vec![
//!     DesiredBucket::named("alpha")
//!         .classification(Classification::Restricted)
//!         .allowed_prefix("exp/"),
//! ]);
//!
//! let mut state = StateDocument::default();
//! let plan = plan(&desired, &state)?;
//! assert_eq!(plan.creates.len(), 1);
//!
//! apply(&backend, &plan, &mut state)?;
//! assert!(!detect(&backend, &state)?.has_drift());
//! # Ok::<(), declarative::Error>(())
//! ```
//!
//! ## Provider Traits
//!
//! - [`Backend`]: create/update/describe buckets
//! - [`StateStore`]: load and save the state document
//! - [`EvidenceSink`]: record plans and drift reports for audit
//! - [`ProgressCallback`] / [`ConfirmCallback`]: UI hooks for apply

pub mod backend;
pub mod context;
pub mod drift;
pub mod error;
pub mod evidence;
pub mod executor;
mod persist;
pub mod planner;
pub mod store;
pub mod types;

// Re-export main types at crate root
pub use backend::{Backend, Call, LocalBackend, MemoryBackend};
pub use context::{
    ApplyAction, AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback,
};
pub use drift::detect;
pub use error::{Error, Operation, Result};
pub use evidence::{DirEvidenceSink, EvidenceSink, EvidenceSinkExt, MemoryEvidenceSink};
pub use executor::{apply, apply_with_progress, execute, execute_simple};
pub use planner::plan;
pub use store::{JsonStateStore, MemoryStateStore, StateStore};
pub use types::{
    ApplyResult, BucketRecord, BucketUpdate, Classification, Descriptor, DesiredBucket,
    DesiredConfig, DriftField, DriftFinding, DriftReport, ExecuteOptions, ExecuteSummary,
    FieldChange, FieldChanges, MissingReason, Plan, PlanOutputs, ResourceKind, StateDocument,
};
