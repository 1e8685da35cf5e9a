//! # push-store
//!
//! Local persistence for received and sent notifications.
//!
//! Received messages are keyed by their remote identity and upserted, so
//! ingesting the same batch twice leaves the store unchanged. Sent records
//! are append-only. Nothing is ever deleted locally.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod sqlite;

pub use error::{Result, StoreError};
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use push_types::{HistoryQuery, MessageRecord, SentRecord};

/// Trait for message store backends.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Insert or overwrite a batch of received messages atomically.
    ///
    /// Returns the number of rows applied: all of them, or an error and none.
    async fn persist_messages(&self, records: &[MessageRecord]) -> Result<usize>;

    /// Append a sent record. Returns its local id.
    async fn log_sent(&self, record: &SentRecord) -> Result<i64>;

    /// Received messages matching the query, newest first.
    async fn query_messages(&self, query: &HistoryQuery) -> Result<Vec<MessageRecord>>;

    /// Sent records matching the query, newest first.
    async fn query_sent(&self, query: &HistoryQuery) -> Result<Vec<SentRecord>>;

    /// Release the backend. Later calls fail with [`StoreError::NotInitialized`].
    async fn close(&self);
}
