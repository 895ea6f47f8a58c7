//! Core types for declarative bucket reconciliation

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Sensitivity tier of a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Classification {
    Public,
    /// Baseline tier applied when a desired entry omits one
    #[default]
    Internal,
    Confidential,
    Restricted,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::Internal => "Internal",
            Self::Confidential => "Confidential",
            Self::Restricted => "Restricted",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind tag carried by records and plan entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    #[default]
    Bucket,
}

// ============================================================================
// Desired Configuration
// ============================================================================

/// A bucket as declared by the operator
///
/// Every field is optional at parse time. Defaults are applied by the
/// planner, and a missing name is reported there as a structural error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredBucket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_prefix: Option<String>,
}

impl DesiredBucket {
    /// Declare a bucket with all defaults
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn public(mut self, public: bool) -> Self {
        self.public = Some(public);
        self
    }

    pub fn classification(mut self, classification: Classification) -> Self {
        self.classification = Some(classification);
        self
    }

    pub fn allowed_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.allowed_prefix = Some(prefix.into());
        self
    }

    /// The declared name, treating an empty string as absent
    pub fn declared_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    /// Resolve into a full record with defaults applied
    ///
    /// `index` is the entry's position, used for the error when the name
    /// is missing.
    pub fn resolve(&self, index: usize) -> Result<BucketRecord> {
        let name = self.declared_name().ok_or(Error::MissingName { index })?;
        Ok(BucketRecord {
            kind: ResourceKind::Bucket,
            name: name.to_string(),
            public: self.public.unwrap_or(false),
            classification: self.classification.unwrap_or_default(),
            allowed_prefix: self.allowed_prefix.clone().unwrap_or_default(),
        })
    }
}

/// The operator's declared target set, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredConfig {
    #[serde(default)]
    pub buckets: Vec<DesiredBucket>,
}

impl DesiredConfig {
    pub fn new(buckets: Vec<DesiredBucket>) -> Self {
        Self { buckets }
    }

    /// Reject entries without a name and duplicate names
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (index, bucket) in self.buckets.iter().enumerate() {
            let name = bucket.declared_name().ok_or(Error::MissingName { index })?;
            if !seen.insert(name) {
                return Err(Error::DuplicateName {
                    name: name.to_string(),
                    origin: "desired configuration",
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// State Document
// ============================================================================

/// A reconciled bucket as recorded in state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRecord {
    #[serde(rename = "type", default)]
    pub kind: ResourceKind,
    pub name: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub classification: Classification,
    #[serde(default)]
    pub allowed_prefix: String,
}

impl BucketRecord {
    pub fn new(
        name: impl Into<String>,
        public: bool,
        classification: Classification,
        allowed_prefix: impl Into<String>,
    ) -> Self {
        Self {
            kind: ResourceKind::Bucket,
            name: name.into(),
            public,
            classification,
            allowed_prefix: allowed_prefix.into(),
        }
    }
}

/// Versioned record of previously reconciled buckets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDocument {
    pub version: u32,
    #[serde(default)]
    pub resources: Vec<BucketRecord>,
}

impl Default for StateDocument {
    fn default() -> Self {
        Self {
            version: 1,
            resources: Vec::new(),
        }
    }
}

impl StateDocument {
    pub fn find(&self, name: &str) -> Option<&BucketRecord> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut BucketRecord> {
        self.resources.iter_mut().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Insert a record, or overwrite the existing one in place
    pub fn upsert(&mut self, record: BucketRecord) {
        match self.find_mut(&record.name) {
            Some(existing) => *existing = record,
            None => self.resources.push(record),
        }
    }

    /// Reject documents that record the same name twice
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for record in &self.resources {
            validate_name(&record.name)?;
            if !seen.insert(record.name.as_str()) {
                return Err(Error::DuplicateName {
                    name: record.name.clone(),
                    origin: "state document",
                });
            }
        }
        Ok(())
    }
}

/// Bucket names become directory names, so they must be a single component.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name == "." || name == ".." {
        Some("name is a relative path component")
    } else if name.contains(['/', '\\']) {
        Some("name contains a path separator")
    } else if name.contains('\0') {
        Some("name contains a NUL byte")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

// ============================================================================
// Plan
// ============================================================================

/// A single field transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange<T> {
    pub from: T,
    pub to: T,
}

impl<T: PartialEq> FieldChange<T> {
    /// A change if the values differ, otherwise `None`
    fn between(from: T, to: T) -> Option<Self> {
        (from != to).then_some(Self { from, to })
    }
}

/// Tracked fields that differ between state and desired
///
/// A `None` slot means the field is unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<FieldChange<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<FieldChange<Classification>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_prefix: Option<FieldChange<String>>,
}

impl FieldChanges {
    /// Compare the tracked fields of a recorded and a desired bucket
    pub fn between(state: &BucketRecord, desired: &BucketRecord) -> Self {
        Self {
            public: FieldChange::between(state.public, desired.public),
            classification: FieldChange::between(state.classification, desired.classification),
            allowed_prefix: FieldChange::between(
                state.allowed_prefix.clone(),
                desired.allowed_prefix.clone(),
            ),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of changed fields
    pub fn len(&self) -> usize {
        usize::from(self.public.is_some())
            + usize::from(self.classification.is_some())
            + usize::from(self.allowed_prefix.is_some())
    }
}

/// A planned in-place update of an existing bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketUpdate {
    #[serde(rename = "type", default)]
    pub kind: ResourceKind,
    pub name: String,
    pub changes: FieldChanges,
}

/// Diagnostic counters, never used for control flow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanOutputs {
    pub count_desired_buckets: usize,
    pub count_state_buckets: usize,
}

/// The computed difference between desired configuration and state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub creates: Vec<BucketRecord>,
    #[serde(default)]
    pub updates: Vec<BucketUpdate>,
    #[serde(default)]
    pub outputs: PlanOutputs,
}

impl Plan {
    /// Check if plan has nothing to do
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty()
    }

    /// Total number of planned operations
    pub fn total_changes(&self) -> usize {
        self.creates.len() + self.updates.len()
    }

    /// Whether a name appears anywhere in the plan
    pub fn touches(&self, name: &str) -> bool {
        self.creates.iter().any(|c| c.name == name) || self.updates.iter().any(|u| u.name == name)
    }
}

// ============================================================================
// Backend view
// ============================================================================

/// Live attributes of a bucket as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub name: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub classification: Classification,
    /// At-rest encryption marker
    #[serde(default)]
    pub encrypted: bool,
    #[serde(default)]
    pub prefix_policies: BTreeSet<String>,
}

impl Descriptor {
    pub fn new(name: impl Into<String>, public: bool, classification: Classification) -> Self {
        Self {
            name: name.into(),
            public,
            classification,
            encrypted: true,
            prefix_policies: BTreeSet::new(),
        }
    }
}

// ============================================================================
// Drift Report
// ============================================================================

/// Tracked fields compared during drift detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftField {
    Public,
    Classification,
}

impl fmt::Display for DriftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => f.write_str("public"),
            Self::Classification => f.write_str("classification"),
        }
    }
}

/// Reason tag for a bucket that vanished from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingReason {
    Missing,
}

/// One divergence between recorded state and the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DriftFinding {
    /// The backend no longer holds the bucket
    Missing { name: String, reason: MissingReason },
    /// A tracked field differs from the recorded value
    Mismatch {
        name: String,
        field: DriftField,
        state: serde_json::Value,
        actual: serde_json::Value,
    },
}

impl DriftFinding {
    pub fn missing(name: impl Into<String>) -> Self {
        Self::Missing {
            name: name.into(),
            reason: MissingReason::Missing,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Missing { name, .. } | Self::Mismatch { name, .. } => name,
        }
    }
}

/// Findings from a drift check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftReport {
    #[serde(default)]
    pub drift: Vec<DriftFinding>,
}

impl DriftReport {
    pub fn has_drift(&self) -> bool {
        !self.drift.is_empty()
    }

    pub fn len(&self) -> usize {
        self.drift.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drift.is_empty()
    }
}

// ============================================================================
// Execution
// ============================================================================

/// Result of applying a single plan entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// Bucket was created (or re-ensured) from a create entry
    Created,
    /// Bucket was updated in place
    Modified,
    /// Entry was not applied
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Modified)
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub modified: usize,
    pub skipped: usize,
}

impl ExecuteSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.modified
    }

    /// Total number of plan entries processed
    pub fn total(&self) -> usize {
        self.created + self.modified + self.skipped
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::Created => self.created += 1,
            ApplyResult::Modified => self.modified += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Options for execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Don't make changes, just report what would happen
    pub dry_run: bool,
    /// Verbose output
    pub verbose: bool,
}
