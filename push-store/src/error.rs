//! Error types for push-store.

use std::path::PathBuf;

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store was closed or never opened.
    #[error("database not initialized")]
    NotInitialized,

    /// Database error.
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Database path error.
    #[error("invalid database path: {path}")]
    InvalidPath {
        /// The invalid path.
        path: PathBuf,
    },

    /// A stored row could not be mapped back to a record.
    #[error("invalid row {id}: {reason}")]
    InvalidRow {
        /// Local id of the row.
        id: i64,
        /// What was wrong with it.
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed => StoreError::NotInitialized,
            other => StoreError::Database(other),
        }
    }
}
