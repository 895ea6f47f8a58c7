//! Desired configuration loading
//!
//! The document is `{ buckets: [...] }` in YAML, TOML or JSON, picked by
//! file extension.

use anyhow::{Context, Result, bail};
use declarative::DesiredConfig;
use std::fs;
use std::path::Path;

/// Supported desired configuration formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Toml,
    Json,
}

impl Format {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    fn parse(self, content: &str) -> Result<DesiredConfig> {
        // An empty document declares nothing
        if content.trim().is_empty() {
            return Ok(DesiredConfig::default());
        }
        let config = match self {
            Self::Yaml => serde_yaml::from_str(content)?,
            Self::Toml => toml::from_str(content)?,
            Self::Json => serde_json::from_str(content)?,
        };
        Ok(config)
    }
}

/// Load the desired configuration from `path`.
///
/// Parsing only. Missing names and duplicates are left to the planner so
/// they surface as structural errors.
pub fn load(path: &Path) -> Result<DesiredConfig> {
    let Some(format) = Format::from_path(path) else {
        bail!(
            "Unsupported desired configuration format: {} (expected .yaml, .yml, .toml or .json)",
            path.display()
        );
    };

    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read desired configuration: {}", path.display()))?;

    let config = format
        .parse(&content)
        .with_context(|| format!("Invalid desired configuration: {}", path.display()))?;

    log::debug!(
        "Loaded {} desired buckets from {}",
        config.buckets.len(),
        path.display()
    );
    Ok(config)
}
