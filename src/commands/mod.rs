pub mod apply;
pub mod drift;
pub mod plan;
pub mod status;

use anyhow::{Context as AnyhowContext, Result};
use declarative::{DirEvidenceSink, JsonStateStore, LocalBackend, StateDocument, StateStore};

use crate::config::Settings;

/// Evidence label of the saved plan
pub const PLAN_EVIDENCE: &str = "plan";
/// Evidence label of the last apply
pub const APPLY_EVIDENCE: &str = "apply";
/// Evidence label of the last drift check
pub const DRIFT_EVIDENCE: &str = "drift";

fn state_store(settings: &Settings) -> JsonStateStore {
    JsonStateStore::new(&settings.state_file)
}

fn load_state(store: &JsonStateStore) -> Result<StateDocument> {
    store
        .load()
        .with_context(|| format!("Could not load state from {}", store.path().display()))
}

fn evidence_sink(settings: &Settings) -> DirEvidenceSink {
    DirEvidenceSink::new(&settings.evidence_dir)
}

fn open_backend(settings: &Settings) -> Result<LocalBackend> {
    LocalBackend::new(&settings.data_root).with_context(|| {
        format!(
            "Could not open data root {}",
            settings.data_root.display()
        )
    })
}
