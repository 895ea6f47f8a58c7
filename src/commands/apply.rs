use anyhow::{Context as AnyhowContext, Result, bail};
use chrono::{DateTime, Utc};
use declarative::{EvidenceSinkExt, ExecuteSummary, Plan, StateDocument, StateStore};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::{
    APPLY_EVIDENCE, PLAN_EVIDENCE, evidence_sink, load_state, open_backend, state_store,
};
use crate::Context;
use crate::cli::ApplyArgs;
use crate::config::Settings;
use crate::engine::{self, ApplyOptions};
use crate::{paths, ui};

/// What `apply` leaves behind for audit
#[derive(Debug, Serialize)]
struct ApplyEvidence<'a> {
    applied_at: DateTime<Utc>,
    plan: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a ExecuteSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    state: &'a StateDocument,
}

pub fn run(ctx: &Context, settings: &Settings, args: &ApplyArgs) -> Result<()> {
    if !ctx.quiet {
        ui::header("Apply");
    }
    if args.dry_run {
        ui::warn("Dry run - no changes will be made");
    }

    let sink = evidence_sink(settings);
    let plan_path: PathBuf = args.plan.as_deref().map_or_else(
        || sink.path_for(PLAN_EVIDENCE),
        paths::expand_path,
    );
    let plan = load_plan(&plan_path)?;

    let backend = open_backend(settings)?;
    let store = state_store(settings);
    let mut state = load_state(&store)?;

    let opts = ApplyOptions {
        dry_run: args.dry_run,
        yes: args.yes,
        quiet: ctx.quiet,
        verbose: ctx.verbose > 0,
    };
    let outcome = engine::execute(&backend, &plan, &mut state, &opts);

    if args.dry_run {
        return outcome.map(|_| ()).map_err(Into::into);
    }
    if let Ok(summary) = &outcome
        && summary.skipped > 0
    {
        return Ok(());
    }

    // Saved on failure too: everything before the failing entry was applied
    store
        .save(&state)
        .with_context(|| format!("Could not save state to {}", store.path().display()))?;

    let evidence = ApplyEvidence {
        applied_at: Utc::now(),
        plan: &plan_path,
        summary: outcome.as_ref().ok(),
        error: outcome.as_ref().err().map(ToString::to_string),
        state: &state,
    };
    let evidence_path = sink
        .record_json(APPLY_EVIDENCE, &evidence)
        .context("Could not save apply evidence")?;
    log::info!("Apply evidence saved to {}", evidence_path.display());

    match outcome {
        Ok(_) => {
            if !ctx.quiet {
                ui::dim(&format!("State saved to {}", store.path().display()));
            }
            Ok(())
        }
        Err(e) => Err(e).with_context(|| {
            format!(
                "Apply stopped; completed changes were recorded in {}",
                store.path().display()
            )
        }),
    }
}

/// Read a plan written by `caixa plan` (or by hand)
fn load_plan(path: &Path) -> Result<Plan> {
    if !path.exists() {
        bail!(
            "No plan found at {}. Run `caixa plan` first.",
            path.display()
        );
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read plan: {}", path.display()))?;
    let plan: Plan = serde_json::from_str(&content)
        .with_context(|| format!("Invalid plan file: {}", path.display()))?;

    log::debug!(
        "Loaded plan with {} creates and {} updates from {}",
        plan.creates.len(),
        plan.updates.len(),
        path.display()
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{BucketRecord, Classification};
    use tempfile::TempDir;

    #[test]
    fn test_load_plan_missing_points_to_plan_command() {
        let dir = TempDir::new().unwrap();
        let err = load_plan(&dir.path().join("plan.json")).unwrap_err();
        assert!(err.to_string().contains("caixa plan"));
    }

    #[test]
    fn test_load_plan_reads_evidence_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.json");
        fs::write(
            &path,
            r#"{
  "creates": [
    {"type": "bucket", "name": "alpha", "public": false,
     "classification": "Restricted", "allowed_prefix": "exp/"}
  ],
  "updates": [],
  "outputs": {"count_desired_buckets": 1, "count_state_buckets": 0}
}"#,
        )
        .unwrap();

        let plan = load_plan(&path).unwrap();
        assert_eq!(
            plan.creates,
            vec![BucketRecord::new(
                "alpha",
                false,
                Classification::Restricted,
                "exp/"
            )]
        );
    }

    #[test]
    fn test_load_plan_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.json");
        fs::write(&path, "not json").unwrap();
        assert!(load_plan(&path).is_err());
    }

    #[test]
    fn test_apply_evidence_shape() {
        let state = StateDocument::default();
        let summary = ExecuteSummary {
            created: 1,
            ..ExecuteSummary::default()
        };
        let evidence = ApplyEvidence {
            applied_at: Utc::now(),
            plan: Path::new(".evidence/plan.json"),
            summary: Some(&summary),
            error: None,
            state: &state,
        };

        let json = serde_json::to_value(&evidence).unwrap();
        assert!(json["applied_at"].is_string());
        assert_eq!(json["summary"]["created"], 1);
        assert!(json.get("error").is_none());
        assert_eq!(json["state"]["version"], 1);
    }
}
