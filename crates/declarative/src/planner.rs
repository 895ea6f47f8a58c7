//! Planner - diffs desired configuration against recorded state
//!
//! Planning is pure: no I/O, no mutation of either input. Buckets recorded
//! in state but absent from the desired configuration are never planned for
//! removal; deletion is not something a plan can express.

use crate::error::Result;
use crate::types::{
    BucketUpdate, DesiredConfig, FieldChanges, Plan, PlanOutputs, ResourceKind, StateDocument,
};
use std::collections::HashSet;

/// Compute the plan that converges `state` towards `desired`.
///
/// Entries of `creates` and `updates` follow the order of `desired`.
///
/// # Errors
/// Structural errors only: a desired entry without a name, or a duplicate
/// name in either input. Semantic differences are never errors.
pub fn plan(desired: &DesiredConfig, state: &StateDocument) -> Result<Plan> {
    desired.validate()?;
    state.validate()?;

    let mut result = Plan::default();

    for (index, bucket) in desired.buckets.iter().enumerate() {
        let record = bucket.resolve(index)?;

        match state.find(&record.name) {
            None => {
                log::debug!("Plan: create '{}'", record.name);
                result.creates.push(record);
            }
            Some(current) => {
                let changes = FieldChanges::between(current, &record);
                if changes.is_empty() {
                    log::debug!("Plan: '{}' is converged", record.name);
                    continue;
                }
                log::debug!("Plan: update '{}' ({} fields)", record.name, changes.len());
                result.updates.push(BucketUpdate {
                    kind: ResourceKind::Bucket,
                    name: record.name,
                    changes,
                });
            }
        }
    }

    let desired_names: HashSet<&str> = desired
        .buckets
        .iter()
        .filter_map(|b| b.declared_name())
        .collect();
    let state_names: HashSet<&str> = state.resources.iter().map(|r| r.name.as_str()).collect();

    for name in state_names.difference(&desired_names) {
        log::debug!("Plan: '{name}' is recorded but not desired, leaving untouched");
    }

    result.outputs = PlanOutputs {
        count_desired_buckets: desired_names.len(),
        count_state_buckets: state_names.len(),
    };

    Ok(result)
}

impl Plan {
    /// Restrict the plan to entries whose name contains `target`
    ///
    /// Outputs keep describing the full inputs.
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => Self {
                creates: self
                    .creates
                    .into_iter()
                    .filter(|c| c.name.contains(t))
                    .collect(),
                updates: self
                    .updates
                    .into_iter()
                    .filter(|u| u.name.contains(t))
                    .collect(),
                outputs: self.outputs,
            },
        }
    }
}
