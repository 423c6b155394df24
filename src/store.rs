//! JSON persistence for the repository list
//!
//! The list is written with sorted keys and four-space indentation so saved
//! files diff cleanly between runs.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{MirrorError, Result};
use crate::repository::Repository;

/// A repository list file on disk
#[derive(Debug, Clone)]
pub struct RepositoryStore {
    path: PathBuf,
}

impl RepositoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the file with `repositories`
    pub fn save(&self, repositories: &[Repository]) -> Result<()> {
        let content = to_json(repositories).map_err(|source| MirrorError::MalformedStore {
            path: self.path.clone(),
            source,
        })?;

        std::fs::write(&self.path, content).map_err(|e| MirrorError::io(&self.path, e))?;
        debug!("Saved {} repositories to {:?}", repositories.len(), self.path);
        Ok(())
    }

    /// Read a previously saved list
    pub fn load(&self) -> Result<Vec<Repository>> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| MirrorError::io(&self.path, e))?;

        let repositories: Vec<Repository> =
            serde_json::from_str(&content).map_err(|source| MirrorError::MalformedStore {
                path: self.path.clone(),
                source,
            })?;

        debug!("Loaded {} repositories from {:?}", repositories.len(), self.path);
        Ok(repositories)
    }
}

fn to_json(repositories: &[Repository]) -> serde_json::Result<Vec<u8>> {
    let value = sort_keys(serde_json::to_value(repositories)?);

    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    Ok(buffer)
}

/// Rebuild every object with its keys in lexicographic order
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(key, value)| (key, sort_keys(value)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
