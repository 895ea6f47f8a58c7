//! Path resolution for caixa
//!
//! # Config File Resolution
//!
//! When `--config` is not given, the first existing file wins:
//! 1. `caixa.toml` in the working directory
//! 2. `$XDG_CONFIG_HOME/caixa/caixa.toml` (if set)
//! 3. Platform config dir (`~/.config/caixa/caixa.toml` on Linux)
//!
//! None of them is required.

use std::path::{Path, PathBuf};

/// File name of the optional project-level config
pub const CONFIG_FILE_NAME: &str = "caixa.toml";

/// Candidate config file locations, highest priority first
pub fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        candidates.push(PathBuf::from(xdg_config).join("caixa").join(CONFIG_FILE_NAME));
    }

    if let Some(dir) = dirs::config_dir() {
        let path = dir.join("caixa").join(CONFIG_FILE_NAME);
        if !candidates.contains(&path) {
            candidates.push(path);
        }
    }

    candidates
}

/// First existing implicit config file, if any
pub fn find_config_file() -> Option<PathBuf> {
    let found = config_candidates().into_iter().find(|p| p.is_file());
    match &found {
        Some(path) => log::debug!("Using config file: {}", path.display()),
        None => log::debug!("No config file found, using defaults"),
    }
    found
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables are left as written.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

/// Expand a path that may already be a `PathBuf`
pub fn expand_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => expand(s),
        None => path.to_path_buf(),
    }
}
