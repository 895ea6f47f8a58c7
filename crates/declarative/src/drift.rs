//! Drift detection - recorded state versus the backend's live attributes
//!
//! Read-only against the backend. Drift is a normal outcome reported through
//! [`DriftReport`], never an error. `allowed_prefix` is not compared: the
//! backend keeps a set of prefix policies that is only ever added to, so it
//! is not expected to mirror the single recorded value.

use crate::backend::Backend;
use crate::error::{Error, Operation, Result};
use crate::types::{DriftField, DriftFinding, DriftReport, StateDocument};

/// Compare every recorded bucket against the backend.
///
/// Findings follow the order of `state.resources`; within a bucket,
/// `public` is reported before `classification`.
pub fn detect(backend: &dyn Backend, state: &StateDocument) -> Result<DriftReport> {
    let mut report = DriftReport::default();

    for record in &state.resources {
        let name = record.name.as_str();
        let actual = backend
            .describe(name)
            .map_err(|e| Error::backend(name, Operation::Describe, e))?;

        let Some(actual) = actual else {
            log::debug!("Drift: '{name}' is missing from the backend");
            report.drift.push(DriftFinding::missing(name));
            continue;
        };

        if actual.public != record.public {
            report.drift.push(DriftFinding::Mismatch {
                name: name.to_string(),
                field: DriftField::Public,
                state: record.public.into(),
                actual: actual.public.into(),
            });
        }

        if actual.classification != record.classification {
            report.drift.push(DriftFinding::Mismatch {
                name: name.to_string(),
                field: DriftField::Classification,
                state: record.classification.as_str().into(),
                actual: actual.classification.as_str().into(),
            });
        }
    }

    log::debug!(
        "Drift check over {} resources: {} findings",
        state.resources.len(),
        report.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::types::{BucketRecord, Classification, Descriptor};

    fn state_with(records: Vec<BucketRecord>) -> StateDocument {
        StateDocument {
            version: 1,
            resources: records,
        }
    }

    #[test]
    fn test_missing_bucket() {
        let backend = MemoryBackend::new();
        let state = state_with(vec![BucketRecord::new(
            "beta",
            false,
            Classification::Internal,
            "",
        )]);

        let report = detect(&backend, &state).unwrap();
        assert_eq!(report.drift, vec![DriftFinding::missing("beta")]);
    }

    #[test]
    fn test_field_mismatches() {
        let backend = MemoryBackend::new().with_bucket(Descriptor::new(
            "alpha",
            true,
            Classification::Public,
        ));
        let state = state_with(vec![BucketRecord::new(
            "alpha",
            false,
            Classification::Restricted,
            "exp/",
        )]);

        let report = detect(&backend, &state).unwrap();
        assert_eq!(
            report.drift,
            vec![
                DriftFinding::Mismatch {
                    name: "alpha".into(),
                    field: DriftField::Public,
                    state: false.into(),
                    actual: true.into(),
                },
                DriftFinding::Mismatch {
                    name: "alpha".into(),
                    field: DriftField::Classification,
                    state: "Restricted".into(),
                    actual: "Public".into(),
                },
            ]
        );
    }

    #[test]
    fn test_prefix_policies_not_compared() {
        let mut descriptor = Descriptor::new("alpha", false, Classification::Internal);
        descriptor.prefix_policies.insert("other/".into());
        let backend = MemoryBackend::new().with_bucket(descriptor);
        let state = state_with(vec![BucketRecord::new(
            "alpha",
            false,
            Classification::Internal,
            "exp/",
        )]);

        assert!(!detect(&backend, &state).unwrap().has_drift());
    }

    #[test]
    fn test_detect_makes_no_mutations() {
        let backend = MemoryBackend::new().with_bucket(Descriptor::new(
            "alpha",
            true,
            Classification::Public,
        ));
        let state = state_with(vec![
            BucketRecord::new("alpha", false, Classification::Internal, ""),
            BucketRecord::new("beta", false, Classification::Internal, ""),
        ]);

        detect(&backend, &state).unwrap();
        assert_eq!(backend.calls().len(), 2);
        assert!(backend.mutations().is_empty());
    }

    #[test]
    fn test_describe_failure_names_resource() {
        let backend = MemoryBackend::new();
        backend.fail_on(Operation::Describe, "alpha");
        let state = state_with(vec![BucketRecord::new(
            "alpha",
            false,
            Classification::Internal,
            "",
        )]);

        let err = detect(&backend, &state).unwrap_err();
        assert_eq!(err.resource_name(), Some("alpha"));
    }
}
