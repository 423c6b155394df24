use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One repository as returned by the hosting API
///
/// Only `name` and `ssh_url` are interpreted; every other field the API
/// sent is kept in `metadata` so a saved list round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,

    pub ssh_url: String,

    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Repository {
    pub fn new(name: impl Into<String>, ssh_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ssh_url: ssh_url.into(),
            metadata: Map::new(),
        }
    }

    /// Convenience for building test fixtures
    #[cfg(test)]
    pub(crate) fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
