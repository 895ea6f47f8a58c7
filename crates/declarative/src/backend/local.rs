//! Local filesystem backend.
//!
//! Each bucket is a directory under the data root holding a `metadata.json`
//! document. Stored attributes are merged, never replaced wholesale, so keys
//! written by other tools survive an `ensure`.

use super::Backend;
use crate::error::{Error, Result};
use crate::persist::{read_json, write_json_atomic};
use crate::types::{Classification, Descriptor, validate_name};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

const METADATA_FILE: &str = "metadata.json";

/// Backend storing buckets as directories on local disk
#[derive(Debug, Clone)]
pub struct LocalBackend {
    data_root: PathBuf,
}

impl LocalBackend {
    /// Create a backend rooted at `data_root`, creating the directory.
    pub fn new(data_root: impl Into<PathBuf>) -> Result<Self> {
        let data_root = data_root.into();
        fs::create_dir_all(&data_root).map_err(|e| Error::io(&data_root, e))?;
        Ok(Self { data_root })
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    fn bucket_dir(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.data_root.join(name))
    }

    fn metadata_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.bucket_dir(name)?.join(METADATA_FILE))
    }

    /// Raw metadata map, so unknown keys can be carried through writes.
    fn read_metadata(&self, name: &str) -> Result<Option<Map<String, Value>>> {
        read_json(&self.metadata_path(name)?)
    }

    fn write_metadata(&self, name: &str, meta: &Map<String, Value>) -> Result<Descriptor> {
        let path = self.metadata_path(name)?;
        write_json_atomic(&path, meta)?;
        serde_json::from_value(Value::Object(meta.clone())).map_err(|e| Error::json(path, e))
    }
}

impl Backend for LocalBackend {
    fn ensure(
        &self,
        name: &str,
        public: bool,
        classification: Classification,
    ) -> Result<Descriptor> {
        let dir = self.bucket_dir(name)?;
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

        // An unreadable metadata file is replaced rather than blocking the ensure
        let mut meta = match self.read_metadata(name) {
            Ok(existing) => existing.unwrap_or_default(),
            Err(e) => {
                log::warn!("Discarding unreadable metadata for '{name}': {e}");
                Map::new()
            }
        };

        meta.insert("name".into(), Value::from(name));
        meta.insert("public".into(), Value::from(public));
        meta.insert(
            "classification".into(),
            Value::from(classification.as_str()),
        );
        meta.insert("encrypted".into(), Value::from(true));
        meta.entry("prefix_policies")
            .or_insert_with(|| Value::Array(Vec::new()));

        log::info!("Ensured bucket '{name}' (public={public}, classification={classification})");
        self.write_metadata(name, &meta)
    }

    fn set_prefix_policy(&self, name: &str, prefix: &str) -> Result<Descriptor> {
        let path = self.metadata_path(name)?;
        let mut meta: Map<String, Value> =
            read_json(&path)?.ok_or_else(|| Error::BucketNotFound {
                name: name.to_string(),
            })?;

        let mut policies: BTreeSet<String> = match meta.get("prefix_policies") {
            Some(value) => {
                serde_json::from_value(value.clone()).map_err(|e| Error::json(&path, e))?
            }
            None => BTreeSet::new(),
        };

        if policies.insert(prefix.to_string()) {
            log::info!("Added prefix policy '{prefix}' to bucket '{name}'");
        } else {
            log::debug!("Prefix policy '{prefix}' already present on '{name}'");
        }

        meta.insert(
            "prefix_policies".into(),
            Value::Array(policies.into_iter().map(Value::from).collect()),
        );
        self.write_metadata(name, &meta)
    }

    fn describe(&self, name: &str) -> Result<Option<Descriptor>> {
        let path = self.metadata_path(name)?;
        let Some(meta) = read_json::<Map<String, Value>>(&path)? else {
            return Ok(None);
        };

        // Metadata without a name does not describe a bucket
        if !meta.get("name").is_some_and(Value::is_string) {
            log::debug!("Metadata for '{name}' has no name, treating bucket as absent");
            return Ok(None);
        }

        serde_json::from_value(Value::Object(meta))
            .map(Some)
            .map_err(|e| Error::json(path, e))
    }
}
