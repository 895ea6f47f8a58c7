//! Error types for reconciliation.
//!
//! Errors fall into two groups: structural input defects, which are fatal
//! before any plan exists, and runtime failures raised while talking to the
//! backend or the filesystem. Backend failures raised during apply carry the
//! resource name and operation so they can be matched against evidence files.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Backend operation that was in flight when a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Create-or-update of a bucket's attributes
    Ensure,
    /// Addition of a prefix to a bucket's policy set
    SetPrefixPolicy,
    /// Read of a bucket's live attributes
    Describe,
}

impl Operation {
    /// Stable lowercase name, used in messages and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ensure => "ensure",
            Self::SetPrefixPolicy => "set_prefix_policy",
            Self::Describe => "describe",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while planning, applying or checking drift.
#[derive(Debug, Error)]
pub enum Error {
    /// A desired entry has no usable name
    #[error("desired bucket at position {index} has no name")]
    MissingName {
        /// Zero-based position in the desired configuration
        index: usize,
    },

    /// The same name appears twice in a document that must be keyed by name
    #[error("duplicate bucket name '{name}' in {origin}")]
    DuplicateName {
        /// The repeated name
        name: String,
        /// Which document contained the duplicate
        origin: &'static str,
    },

    /// A name that cannot be used as a bucket identifier
    #[error("invalid bucket name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// The backend holds no bucket with this name
    #[error("bucket not found: {name}")]
    BucketNotFound { name: String },

    /// An update targets a bucket the state document does not record
    #[error("'{name}' is planned as an update but is not recorded in state")]
    NotInState { name: String },

    /// The backend refused a request
    #[error("backend rejected request: {message}")]
    Rejected { message: String },

    /// A backend call failed during apply or drift detection
    #[error("{operation} failed for '{name}': {source}")]
    Backend {
        name: String,
        operation: Operation,
        #[source]
        source: Box<Error>,
    },

    /// The confirmation prompt could not be shown or read
    #[error("confirmation prompt failed: {source}")]
    Prompt {
        #[source]
        source: std::io::Error,
    },

    /// IO error at a known path
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed or unserializable JSON at a known path
    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Whether this error is a defect in the input documents.
    ///
    /// Structural errors are raised before any backend call is made.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::MissingName { .. } | Self::DuplicateName { .. } | Self::InvalidName { .. }
        )
    }

    /// Name of the resource this error concerns, if any.
    pub fn resource_name(&self) -> Option<&str> {
        match self {
            Self::DuplicateName { name, .. }
            | Self::InvalidName { name, .. }
            | Self::BucketNotFound { name }
            | Self::NotInState { name }
            | Self::Backend { name, .. } => Some(name),
            _ => None,
        }
    }

    pub(crate) fn backend(name: &str, operation: Operation, source: Self) -> Self {
        Self::Backend {
            name: name.to_string(),
            operation,
            source: Box::new(source),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_classification() {
        assert!(Error::MissingName { index: 0 }.is_structural());
        assert!(
            Error::DuplicateName {
                name: "alpha".into(),
                origin: "state",
            }
            .is_structural()
        );
        assert!(
            !Error::BucketNotFound {
                name: "alpha".into()
            }
            .is_structural()
        );
    }

    #[test]
    fn test_backend_error_carries_context() {
        let err = Error::backend(
            "alpha",
            Operation::Ensure,
            Error::Rejected {
                message: "quota exceeded".into(),
            },
        );
        assert_eq!(err.resource_name(), Some("alpha"));
        let msg = err.to_string();
        assert!(msg.contains("ensure"));
        assert!(msg.contains("alpha"));
        assert!(msg.contains("quota exceeded"));
    }
}
