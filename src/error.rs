//! Error types shared by every repomirror component

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for repomirror operations
pub type Result<T, E = MirrorError> = std::result::Result<T, E>;

/// Errors that can occur while listing, storing or syncing repositories
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Unable to authenticate (status {status}): {body}")]
    Authentication { status: u16, body: String },

    #[error("Unable to connect (status {status}): {body}")]
    Connection { status: u16, body: String },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Response from {url} is not a repository list: {source}")]
    MalformedResponse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Command exited with code {code}: {command}")]
    CommandExecution { command: String, code: i32 },

    #[error("Command was terminated by a signal: {command}")]
    CommandTerminated { command: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Repository list {path:?} is malformed: {source}")]
    MalformedStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not read {what} from the terminal: {source}")]
    Prompt {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl MirrorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MirrorError::Io {
            path: path.into(),
            source,
        }
    }
}
