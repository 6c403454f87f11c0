//! Store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while persisting or reading exam records.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the store location failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be serialized.
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A stored file is not a valid record.
    #[error("corrupt record {path}: {message}")]
    Corrupt { path: PathBuf, message: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
