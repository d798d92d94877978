//! Error types for the record store.

use oleh_core::error::OlehError;

/// Errors from the SQLite record store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to open database: {0}")]
    Open(String),
    #[error("Migration failed: {0}")]
    Migration(String),
    #[error("{0}")]
    Query(String),
    #[error("Database lock poisoned: {0}")]
    LockPoisoned(String),
    #[error("Table not found: {0}")]
    UnknownTable(String),
    #[error("Import failed: {0}")]
    Import(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Query(err.to_string())
    }
}

impl From<StorageError> for OlehError {
    fn from(err: StorageError) -> Self {
        OlehError::Storage(err.to_string())
    }
}
