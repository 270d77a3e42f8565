use std::path::PathBuf;

use thiserror::Error;

/// Error type that captures store, query, and backup failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Store unavailable at {path}: {reason}")]
    StoreUnavailable { path: PathBuf, reason: String },
    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),
    #[error("Malformed record: {0}")]
    MalformedRecord(String),
    #[error("No backup available in {0}")]
    NoBackupAvailable(PathBuf),
    #[error("Table is full ({0} rows)")]
    TableFull(usize),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl LedgerError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        LedgerError::StoreUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns `true` when a restore from backup is the expected recovery.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, LedgerError::StoreUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
