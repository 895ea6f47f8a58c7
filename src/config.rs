//! Runtime settings
//!
//! Layering, lowest to highest: built-in defaults, the TOML config file,
//! then command-line flags (which clap also fills from `CAIXA_*` variables).
//! Every path is `~`/`$VAR` expanded once all layers are merged.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

/// Every option the CLI understands, fully resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root directory of the local bucket backend
    pub data_root: PathBuf,
    /// Where plan/apply/drift evidence is written
    pub evidence_dir: PathBuf,
    /// State document location
    pub state_file: PathBuf,
    /// Desired configuration location
    pub desired_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("./data"),
            evidence_dir: PathBuf::from("./.evidence"),
            state_file: PathBuf::from("state/state.json"),
            desired_file: PathBuf::from("desired/config.yaml"),
        }
    }
}

/// The config file layer; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    data_root: Option<String>,
    evidence_dir: Option<String>,
    state_file: Option<String>,
    desired_file: Option<String>,
}

/// Values given on the command line (or through `CAIXA_*`)
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_root: Option<PathBuf>,
    pub evidence_dir: Option<PathBuf>,
    pub state_file: Option<PathBuf>,
    pub desired_file: Option<PathBuf>,
}

impl Settings {
    /// Resolve settings for this invocation.
    ///
    /// An explicit `config` path must exist; otherwise the implicit
    /// locations from [`paths::find_config_file`] are optional.
    pub fn load(config: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let file = match config {
            Some(path) => {
                let path = paths::expand_path(path);
                if !path.is_file() {
                    bail!("Config file not found: {}", path.display());
                }
                Some(path)
            }
            None => paths::find_config_file(),
        };
        Self::layered(file.as_deref(), overrides)
    }

    /// Merge defaults, the given config file and the overrides
    fn layered(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(path) = file {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Could not read config file: {}", path.display()))?;
            let layer: FileSettings = toml::from_str(&content)
                .with_context(|| format!("Invalid config file: {}", path.display()))?;
            settings.merge_file(layer);
        }

        settings.merge_overrides(overrides);
        Ok(settings.expanded())
    }

    fn merge_file(&mut self, layer: FileSettings) {
        if let Some(v) = layer.data_root {
            self.data_root = PathBuf::from(v);
        }
        if let Some(v) = layer.evidence_dir {
            self.evidence_dir = PathBuf::from(v);
        }
        if let Some(v) = layer.state_file {
            self.state_file = PathBuf::from(v);
        }
        if let Some(v) = layer.desired_file {
            self.desired_file = PathBuf::from(v);
        }
    }

    fn merge_overrides(&mut self, overrides: &Overrides) {
        if let Some(v) = &overrides.data_root {
            self.data_root = v.clone();
        }
        if let Some(v) = &overrides.evidence_dir {
            self.evidence_dir = v.clone();
        }
        if let Some(v) = &overrides.state_file {
            self.state_file = v.clone();
        }
        if let Some(v) = &overrides.desired_file {
            self.desired_file = v.clone();
        }
    }

    fn expanded(self) -> Self {
        Self {
            data_root: paths::expand_path(&self.data_root),
            evidence_dir: paths::expand_path(&self.evidence_dir),
            state_file: paths::expand_path(&self.state_file),
            desired_file: paths::expand_path(&self.desired_file),
        }
    }
}
