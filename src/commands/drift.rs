use anyhow::{Context as AnyhowContext, Result};
use declarative::{DriftReport, EvidenceSinkExt};
use std::process::ExitCode;

use super::{DRIFT_EVIDENCE, evidence_sink, load_state, open_backend, state_store};
use crate::Context;
use crate::config::Settings;
use crate::engine::display_drift;
use crate::ui;

/// Exit status when the check completed and found drift
pub const DRIFT_EXIT_CODE: u8 = 2;

/// Check recorded state against the backend.
///
/// Drift is not an error: it is reported through the exit status.
pub fn run(ctx: &Context, settings: &Settings) -> Result<ExitCode> {
    if !ctx.quiet {
        ui::header("Drift");
    }

    let report = check(ctx, settings)?;
    Ok(exit_code(report.has_drift()))
}

/// Detect drift, record it as evidence and display it
fn check(ctx: &Context, settings: &Settings) -> Result<DriftReport> {
    let backend = open_backend(settings)?;
    let state = load_state(&state_store(settings))?;

    let report = declarative::detect(&backend, &state).context("Drift check failed")?;

    let path = evidence_sink(settings)
        .record_json(DRIFT_EVIDENCE, &report)
        .context("Could not save drift evidence")?;

    display_drift(&report);
    if !ctx.quiet {
        ui::dim(&format!("Drift report saved to {}", path.display()));
    }

    Ok(report)
}

fn exit_code(has_drift: bool) -> ExitCode {
    if has_drift {
        ExitCode::from(DRIFT_EXIT_CODE)
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{BucketRecord, Classification, StateDocument, StateStore};
    use std::fs;
    use tempfile::TempDir;

    fn settings_in(dir: &TempDir) -> Settings {
        Settings {
            data_root: dir.path().join("data"),
            evidence_dir: dir.path().join(".evidence"),
            state_file: dir.path().join("state/state.json"),
            desired_file: dir.path().join("desired/config.yaml"),
        }
    }

    fn quiet() -> Context {
        Context {
            verbose: 0,
            quiet: true,
        }
    }

    #[test]
    fn test_missing_bucket_is_reported_and_recorded() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(&dir);
        let state = StateDocument {
            version: 1,
            resources: vec![BucketRecord::new(
                "beta",
                false,
                Classification::Internal,
                "",
            )],
        };
        state_store(&settings).save(&state).unwrap();

        let report = check(&quiet(), &settings).unwrap();
        assert!(report.has_drift());

        let evidence: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(settings.evidence_dir.join("drift.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(
            evidence,
            serde_json::json!({"drift": [{"name": "beta", "reason": "missing"}]})
        );
    }

    #[test]
    fn test_empty_state_has_no_drift() {
        let dir = TempDir::new().unwrap();
        let report = check(&quiet(), &settings_in(&dir)).unwrap();
        assert!(!report.has_drift());
    }
}
