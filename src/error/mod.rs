//! Error taxonomy for collection, enrichment, storage and alignment.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed shard or log content. Fatal to the collection call.
    #[error("malformed input {}: {reason}", .path.display())]
    InputFormat { path: PathBuf, reason: String },

    #[error("explorer request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid explorer response for {tx_hash}: {reason}")]
    InvalidResponse { tx_hash: String, reason: String },

    #[error("not a transaction hash: {0:?}")]
    InvalidTxHash(String),

    #[error("transaction not found: {0}")]
    TransactionNotFound(String),

    /// Mean requested over zero samples.
    #[error("no samples for label {0:?}")]
    EmptyDataset(String),

    #[error("label {label:?} missing from {missing_from} dataset")]
    MissingLabel {
        label: String,
        missing_from: &'static str,
    },

    #[error("secondary dataset has {secondary} entries, primary has {primary}")]
    LengthMismatch { primary: usize, secondary: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("index database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn input_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InputFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error belongs to a single transaction and can be skipped in a batch.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Error::Http(_)
                | Error::InvalidResponse { .. }
                | Error::TransactionNotFound(_)
                | Error::InvalidTxHash(_)
        )
    }
}
