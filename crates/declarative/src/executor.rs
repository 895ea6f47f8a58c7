//! Execution engine - applies a plan against a backend and advances state
//!
//! Entries are applied one at a time in plan order, creates first. The first
//! backend failure aborts the rest of the plan; everything applied before it
//! stays applied and stays recorded in the state document. There is no retry
//! and no rollback.

use crate::backend::Backend;
use crate::context::{ApplyAction, ConfirmCallback, NoProgress, ProgressCallback};
use crate::error::{Error, Operation, Result};
use crate::types::{
    ApplyResult, BucketRecord, BucketUpdate, ExecuteOptions, ExecuteSummary, Plan, StateDocument,
};

/// Apply a plan, updating `state` in place.
///
/// On error, `state` reflects exactly the entries that completed before the
/// failing one, and the error names the resource and operation.
pub fn apply(
    backend: &dyn Backend,
    plan: &Plan,
    state: &mut StateDocument,
) -> Result<ExecuteSummary> {
    apply_with_progress(backend, plan, state, &mut NoProgress)
}

/// Apply a plan, reporting each entry to `progress`.
pub fn apply_with_progress<P: ProgressCallback>(
    backend: &dyn Backend,
    plan: &Plan,
    state: &mut StateDocument,
    progress: &mut P,
) -> Result<ExecuteSummary> {
    progress.on_start(plan.total_changes());
    let outcome = apply_entries(backend, plan, state, progress);
    progress.on_complete();
    outcome
}

fn apply_entries<P: ProgressCallback>(
    backend: &dyn Backend,
    plan: &Plan,
    state: &mut StateDocument,
    progress: &mut P,
) -> Result<ExecuteSummary> {
    let mut summary = ExecuteSummary::default();

    for record in &plan.creates {
        progress.on_resource_start(&record.name, ApplyAction::Create);
        let result = apply_create(backend, record, state)?;
        progress.on_resource_complete(&record.name, &result);
        summary.add_result(&result);
    }

    for update in &plan.updates {
        progress.on_resource_start(&update.name, ApplyAction::Update);
        let result = apply_update(backend, update, state)?;
        progress.on_resource_complete(&update.name, &result);
        summary.add_result(&result);
    }

    Ok(summary)
}

fn apply_create(
    backend: &dyn Backend,
    record: &BucketRecord,
    state: &mut StateDocument,
) -> Result<ApplyResult> {
    let name = record.name.as_str();

    backend
        .ensure(name, record.public, record.classification)
        .map_err(|e| Error::backend(name, Operation::Ensure, e))?;

    if !record.allowed_prefix.is_empty() {
        backend
            .set_prefix_policy(name, &record.allowed_prefix)
            .map_err(|e| Error::backend(name, Operation::SetPrefixPolicy, e))?;
    }

    state.upsert(record.clone());
    log::debug!("Applied create for '{name}'");
    Ok(ApplyResult::Created)
}

fn apply_update(
    backend: &dyn Backend,
    update: &BucketUpdate,
    state: &mut StateDocument,
) -> Result<ApplyResult> {
    let name = update.name.as_str();
    let changes = &update.changes;

    let record = state.find_mut(name).ok_or_else(|| Error::NotInState {
        name: name.to_string(),
    })?;

    // Unchanged fields come from the backend, not from the recorded state,
    // so out-of-band changes to them are not silently reverted.
    let current = backend
        .describe(name)
        .map_err(|e| Error::backend(name, Operation::Describe, e))?
        .ok_or_else(|| {
            Error::backend(
                name,
                Operation::Describe,
                Error::BucketNotFound {
                    name: name.to_string(),
                },
            )
        })?;

    let public = changes.public.as_ref().map_or(current.public, |c| c.to);
    let classification = changes
        .classification
        .as_ref()
        .map_or(current.classification, |c| c.to);

    backend
        .ensure(name, public, classification)
        .map_err(|e| Error::backend(name, Operation::Ensure, e))?;

    // Policies are additive: the previous prefix stays in the backend's set
    if let Some(prefix) = &changes.allowed_prefix {
        backend
            .set_prefix_policy(name, &prefix.to)
            .map_err(|e| Error::backend(name, Operation::SetPrefixPolicy, e))?;
    }

    if let Some(c) = &changes.public {
        record.public = c.to;
    }
    if let Some(c) = &changes.classification {
        record.classification = c.to;
    }
    if let Some(c) = &changes.allowed_prefix {
        record.allowed_prefix = c.to.clone();
    }

    log::debug!("Applied update for '{name}' ({} fields)", changes.len());
    Ok(ApplyResult::Modified)
}

/// Execute a plan with confirmation and progress reporting
///
/// An empty plan returns immediately without asking. A dry run or a
/// declined confirmation makes no backend calls and leaves `state` as is.
pub fn execute<P, C>(
    backend: &dyn Backend,
    plan: &Plan,
    state: &mut StateDocument,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let total_changes = plan.total_changes();

    if total_changes == 0 {
        return Ok(ExecuteSummary::default());
    }

    // Confirm before proceeding (unless dry_run)
    if !opts.dry_run && !confirm.confirm(&format!("Apply {total_changes} changes?"))? {
        return Ok(ExecuteSummary {
            skipped: total_changes,
            ..Default::default()
        });
    }

    if opts.dry_run {
        return Ok(ExecuteSummary::default());
    }

    let summary = apply_with_progress(backend, plan, state, progress)?;
    if opts.verbose {
        log::info!(
            "Applied {} creates and {} updates",
            summary.created,
            summary.modified
        );
    }
    Ok(summary)
}

/// Simple execution without callbacks
pub fn execute_simple(
    backend: &dyn Backend,
    plan: &Plan,
    state: &mut StateDocument,
    opts: &ExecuteOptions,
) -> Result<ExecuteSummary> {
    use crate::context::AutoConfirm;

    execute(backend, plan, state, opts, &mut NoProgress, &mut AutoConfirm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Call, MemoryBackend};
    use crate::context::AutoDecline;
    use crate::planner::plan;
    use crate::types::{
        Classification, Descriptor, DesiredBucket, DesiredConfig, FieldChange, FieldChanges,
        ResourceKind,
    };

    fn record(name: &str, prefix: &str) -> BucketRecord {
        BucketRecord::new(name, false, Classification::Restricted, prefix)
    }

    fn create_plan(records: Vec<BucketRecord>) -> Plan {
        Plan {
            creates: records,
            ..Plan::default()
        }
    }

    /// Records every callback for assertions
    #[derive(Default)]
    struct RecordingProgress {
        events: Vec<String>,
    }

    impl ProgressCallback for RecordingProgress {
        fn on_start(&mut self, total: usize) {
            self.events.push(format!("start:{total}"));
        }
        fn on_resource_start(&mut self, name: &str, action: ApplyAction) {
            self.events.push(format!("{action:?}:{name}"));
        }
        fn on_resource_complete(&mut self, name: &str, _result: &ApplyResult) {
            self.events.push(format!("done:{name}"));
        }
        fn on_complete(&mut self) {
            self.events.push("complete".into());
        }
    }

    #[test]
    fn test_create_ensures_and_sets_prefix() {
        let backend = MemoryBackend::new();
        let mut state = StateDocument::default();

        let plan = create_plan(vec![record("alpha", "exp/")]);
        let summary = apply(&backend, &plan, &mut state).unwrap();

        assert_eq!(summary.created, 1);
        assert_eq!(state.resources, vec![record("alpha", "exp/")]);
        let desc = backend.get("alpha").unwrap();
        assert_eq!(desc.classification, Classification::Restricted);
        assert!(desc.prefix_policies.contains("exp/"));
    }

    #[test]
    fn test_create_without_prefix_skips_policy_call() {
        let backend = MemoryBackend::new();
        let mut state = StateDocument::default();
        apply(&backend, &create_plan(vec![record("docs", "")]), &mut state).unwrap();

        assert!(
            !backend
                .calls()
                .iter()
                .any(|c| matches!(c, Call::SetPrefixPolicy { .. }))
        );
    }

    #[test]
    fn test_update_falls_back_to_backend_values() {
        // State says public=false, but someone made it public out of band.
        let backend = MemoryBackend::new().with_bucket(Descriptor {
            public: true,
            ..Descriptor::new("alpha", false, Classification::Restricted)
        });
        let mut state = StateDocument {
            version: 1,
            resources: vec![record("alpha", "exp/")],
        };
        let plan = Plan {
            updates: vec![BucketUpdate {
                kind: ResourceKind::Bucket,
                name: "alpha".into(),
                changes: FieldChanges {
                    classification: Some(FieldChange {
                        from: Classification::Restricted,
                        to: Classification::Internal,
                    }),
                    ..FieldChanges::default()
                },
            }],
            ..Plan::default()
        };

        let summary = apply(&backend, &plan, &mut state).unwrap();
        assert_eq!(summary.modified, 1);

        assert!(backend.calls().contains(&Call::Ensure {
            name: "alpha".into(),
            public: true,
            classification: Classification::Internal,
        }));
        // Only the changed field is written to state
        assert!(!state.resources[0].public);
        assert_eq!(state.resources[0].classification, Classification::Internal);
    }

    fn prefix_update(name: &str, from: &str, to: &str) -> Plan {
        Plan {
            updates: vec![BucketUpdate {
                kind: ResourceKind::Bucket,
                name: name.into(),
                changes: FieldChanges {
                    allowed_prefix: Some(FieldChange {
                        from: from.into(),
                        to: to.into(),
                    }),
                    ..FieldChanges::default()
                },
            }],
            ..Plan::default()
        }
    }

    fn recorded_bucket(name: &str, prefix: &str) -> (MemoryBackend, StateDocument) {
        let backend = MemoryBackend::new();
        let mut state = StateDocument::default();
        apply(&backend, &create_plan(vec![record(name, prefix)]), &mut state).unwrap();
        backend.clear_calls();
        (backend, state)
    }

    #[test]
    fn test_update_adds_new_prefix_policy() {
        let (backend, mut state) = recorded_bucket("alpha", "exp/");

        let summary = apply(&backend, &prefix_update("alpha", "exp/", "new/"), &mut state).unwrap();
        assert_eq!(summary.modified, 1);

        assert!(backend.calls().contains(&Call::SetPrefixPolicy {
            name: "alpha".into(),
            prefix: "new/".into(),
        }));
        assert_eq!(state.resources, vec![record("alpha", "new/")]);

        let policies: Vec<_> = backend.get("alpha").unwrap().prefix_policies.into_iter().collect();
        assert_eq!(policies, ["exp/", "new/"]);
    }

    #[test]
    fn test_update_to_empty_prefix_still_sets_policy() {
        let (backend, mut state) = recorded_bucket("alpha", "exp/");

        apply(&backend, &prefix_update("alpha", "exp/", ""), &mut state).unwrap();

        assert_eq!(
            backend.mutations().last(),
            Some(&Call::SetPrefixPolicy {
                name: "alpha".into(),
                prefix: String::new(),
            })
        );
        assert_eq!(state.resources[0].allowed_prefix, "");
    }

    #[test]
    fn test_update_of_unrecorded_bucket_fails() {
        let backend = MemoryBackend::new();
        let mut state = StateDocument::default();
        let plan = Plan {
            updates: vec![BucketUpdate {
                kind: ResourceKind::Bucket,
                name: "ghost".into(),
                changes: FieldChanges::default(),
            }],
            ..Plan::default()
        };

        let err = apply(&backend, &plan, &mut state).unwrap_err();
        assert!(matches!(err, Error::NotInState { .. }));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_update_of_vanished_bucket_fails_on_describe() {
        let backend = MemoryBackend::new();
        let mut state = StateDocument {
            version: 1,
            resources: vec![record("alpha", "")],
        };
        let desired = DesiredConfig::new(vec![DesiredBucket::named("alpha").public(true)]);
        let plan = plan(&desired, &state).unwrap();

        let err = apply(&backend, &plan, &mut state).unwrap_err();
        assert!(matches!(
            err,
            Error::Backend {
                operation: Operation::Describe,
                ..
            }
        ));
        assert!(backend.mutations().is_empty());
    }

    #[test]
    fn test_failure_keeps_completed_prefix() {
        let backend = MemoryBackend::new();
        backend.fail_on(Operation::Ensure, "b");
        let mut state = StateDocument::default();
        let plan = create_plan(vec![record("a", ""), record("b", ""), record("c", "")]);

        let err = apply(&backend, &plan, &mut state).unwrap_err();

        assert_eq!(err.resource_name(), Some("b"));
        assert!(matches!(
            err,
            Error::Backend {
                operation: Operation::Ensure,
                ..
            }
        ));
        let names: Vec<_> = state.resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a"]);
        assert!(backend.get("c").is_none());
    }

    #[test]
    fn test_prefix_failure_leaves_entry_unrecorded() {
        let backend = MemoryBackend::new();
        backend.fail_on(Operation::SetPrefixPolicy, "a");
        let mut state = StateDocument::default();

        let plan = create_plan(vec![record("a", "x/")]);
        let err = apply(&backend, &plan, &mut state).unwrap_err();
        assert!(matches!(
            err,
            Error::Backend {
                operation: Operation::SetPrefixPolicy,
                ..
            }
        ));
        assert!(state.resources.is_empty());
    }

    #[test]
    fn test_reapplying_same_plan_is_idempotent() {
        let backend = MemoryBackend::new();
        let mut state = StateDocument::default();
        let plan = create_plan(vec![record("alpha", "exp/")]);

        apply(&backend, &plan, &mut state).unwrap();
        let after_first = (state.clone(), backend.get("alpha"));
        apply(&backend, &plan, &mut state).unwrap();

        assert_eq!((state, backend.get("alpha")), after_first);
    }

    #[test]
    fn test_progress_callbacks_in_order() {
        let backend = MemoryBackend::new();
        backend.fail_on(Operation::Ensure, "b");
        let mut state = StateDocument::default();
        let mut progress = RecordingProgress::default();

        let _ = apply_with_progress(
            &backend,
            &create_plan(vec![record("a", ""), record("b", "")]),
            &mut state,
            &mut progress,
        );

        assert_eq!(
            progress.events,
            ["start:2", "Create:a", "done:a", "Create:b", "complete"]
        );
    }

    #[test]
    fn test_execute_empty_plan() {
        let backend = MemoryBackend::new();
        let mut state = StateDocument::default();
        let opts = ExecuteOptions::default();
        let summary = execute_simple(&backend, &Plan::default(), &mut state, &opts).unwrap();

        assert_eq!(summary.total(), 0);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_execute_dry_run_makes_no_calls() {
        let backend = MemoryBackend::new();
        let mut state = StateDocument::default();
        let opts = ExecuteOptions {
            dry_run: true,
            ..ExecuteOptions::default()
        };

        let plan = create_plan(vec![record("a", "")]);
        let summary = execute_simple(&backend, &plan, &mut state, &opts).unwrap();
        assert_eq!(summary.total_changes(), 0);
        assert!(backend.calls().is_empty());
        assert!(state.resources.is_empty());
    }

    #[test]
    fn test_execute_declined() {
        let backend = MemoryBackend::new();
        let mut state = StateDocument::default();

        let summary = execute(
            &backend,
            &create_plan(vec![record("a", ""), record("b", "")]),
            &mut state,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoDecline,
        )
        .unwrap();

        assert_eq!(summary.skipped, 2);
        assert!(backend.is_empty());
    }
}
