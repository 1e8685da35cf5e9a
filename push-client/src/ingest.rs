//! Receive-persist-acknowledge pipeline.
//!
//! One cycle:
//!
//! 1. fetch the unread batch (failure aborts the cycle, nothing changes),
//! 2. persist it in one transaction (failure becomes `persist_warning`),
//! 3. compute the acknowledgment cursor from the cursor the fetch returned,
//!    the caller's cursor, and the fetched ids,
//! 4. acknowledge up to it (failure becomes `ack_warning`).
//!
//! Acknowledgment runs even when persistence failed. Redelivered messages
//! upsert by remote id, so a repeated batch leaves the store unchanged.

use crate::client::{FetchResult, PushClient};
use crate::error::Result;
use crate::transport::Transport;
use chrono::Utc;
use push_core::{ack_cursor, from_received};
use push_store::MessageStore;
use push_types::{MessageId, ReceivedMessage};
use serde::Serialize;

/// Options for one ingestion cycle.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Cap on messages returned in the report. Does not limit persistence.
    pub limit: Option<usize>,
    /// Cursor to acknowledge up to in addition to the fetch response's cursor
    /// and the fetched ids.
    pub explicit_cursor: Option<MessageId>,
}

impl IngestOptions {
    /// Cap the messages returned in the report.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Also acknowledge up to `cursor`.
    pub fn with_cursor(mut self, cursor: MessageId) -> Self {
        self.explicit_cursor = Some(cursor);
        self
    }
}

/// Outcome of one ingestion cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// Messages the service returned.
    pub fetched: usize,
    /// Messages included in `messages`.
    pub returned: usize,
    /// Rows written to the store (all or none).
    pub persisted: usize,
    /// Cursor that was acknowledged, or attempted.
    pub ack_cursor: Option<MessageId>,
    /// Fetched messages, capped by the limit.
    pub messages: Vec<ReceivedMessage>,
    /// Why persistence failed, if it did.
    pub persist_warning: Option<String>,
    /// Why acknowledgment failed, if it did.
    pub ack_warning: Option<String>,
}

impl IngestReport {
    /// The acknowledged cursor as an integer, 0 when nothing was acknowledged.
    pub fn acked_up_to(&self) -> i64 {
        match (&self.ack_cursor, &self.ack_warning) {
            (Some(c), None) => c.value(),
            _ => 0,
        }
    }

    /// Whether any step degraded to a warning.
    pub fn has_warnings(&self) -> bool {
        self.persist_warning.is_some() || self.ack_warning.is_some()
    }
}

/// Run one fetch, persist, acknowledge cycle.
pub async fn ingest<T, S>(
    client: &PushClient<T>,
    store: &S,
    options: &IngestOptions,
) -> Result<IngestReport>
where
    T: Transport,
    S: MessageStore + ?Sized,
{
    let FetchResult {
        messages: fetched,
        last,
        ..
    } = client.fetch_messages().await?;

    let mut report = IngestReport {
        fetched: fetched.len(),
        ..IngestReport::default()
    };

    if !fetched.is_empty() {
        let records = from_received(&fetched, Utc::now());
        match store.persist_messages(&records).await {
            Ok(n) => report.persisted = n,
            Err(e) => {
                tracing::warn!("failed to persist {} messages: {}", records.len(), e);
                report.persist_warning = Some(format!("failed to persist messages: {e}"));
            }
        }
    }

    let explicit = [last, options.explicit_cursor].into_iter().flatten().max();
    report.ack_cursor = ack_cursor(explicit, fetched.iter().map(|m| m.id));
    if let Some(cursor) = report.ack_cursor {
        if let Err(e) = client.acknowledge(cursor).await {
            tracing::warn!("failed to acknowledge up to {}: {}", cursor, e);
            report.ack_warning = Some(format!("failed to acknowledge messages: {e}"));
        }
    }

    let mut messages = fetched;
    if let Some(limit) = options.limit {
        messages.truncate(limit);
    }
    report.returned = messages.len();
    report.messages = messages;

    tracing::info!(
        "ingested {} messages ({} persisted, acked up to {})",
        report.fetched,
        report.persisted,
        report.acked_up_to()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::credentials::Credentials;
    use crate::error::ClientError;
    use crate::transport::{MockTransport, TransportError};
    use async_trait::async_trait;
    use push_store::{SqliteStore, StoreError};
    use push_types::{HistoryQuery, MessageRecord, SentRecord};
    use serde_json::json;
    use std::time::Duration;

    fn client(transport: &MockTransport) -> PushClient<MockTransport> {
        PushClient::new(
            ClientConfig::default()
                .with_base_url("https://api.example.com/1")
                .with_retry_delay(Duration::from_millis(1)),
            Credentials::new("tok", "usr").with_device("dev", "dsec"),
            transport.clone(),
        )
        .unwrap()
    }

    fn batch(ids: &[i64]) -> serde_json::Value {
        let messages: Vec<_> = ids
            .iter()
            .map(|id| json!({"id": id, "message": format!("msg {id}"), "date": 1_700_000_000}))
            .collect();
        json!({"status": 1, "request": "r", "messages": messages})
    }

    /// Store whose writes always fail.
    struct BrokenStore;

    #[async_trait]
    impl MessageStore for BrokenStore {
        async fn persist_messages(&self, _: &[MessageRecord]) -> push_store::Result<usize> {
            Err(StoreError::Migration("disk is read-only".into()))
        }
        async fn log_sent(&self, _: &SentRecord) -> push_store::Result<i64> {
            Err(StoreError::NotInitialized)
        }
        async fn query_messages(&self, _: &HistoryQuery) -> push_store::Result<Vec<MessageRecord>> {
            Ok(Vec::new())
        }
        async fn query_sent(&self, _: &HistoryQuery) -> push_store::Result<Vec<SentRecord>> {
            Ok(Vec::new())
        }
        async fn close(&self) {}
    }

    #[tokio::test]
    async fn persists_and_acks_highest_id() {
        let transport = MockTransport::new();
        transport.queue_json(200, batch(&[100, 105]));
        transport.queue_json(200, json!({"status": 1}));
        let store = SqliteStore::in_memory().await.unwrap();

        let report = ingest(&client(&transport), &store, &IngestOptions::default())
            .await
            .unwrap();

        assert_eq!(report.fetched, 2);
        assert_eq!(report.persisted, 2);
        assert_eq!(report.ack_cursor, Some(MessageId::new(105)));
        assert_eq!(report.acked_up_to(), 105);
        assert!(!report.has_warnings());

        let ack = transport.last_request().unwrap();
        assert!(ack.url.path().ends_with("/update_highest_message.json"));
        assert_eq!(ack.get_param("message"), Some("105"));

        let stored = store.query_messages(&HistoryQuery::new(10)).await.unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[tokio::test]
    async fn response_cursor_above_fetched_ids_is_acked() {
        let transport = MockTransport::new();
        let mut reply = batch(&[100, 105]);
        reply["last"] = json!(200);
        transport.queue_json(200, reply);
        transport.queue_json(200, json!({"status": 1}));
        let store = SqliteStore::in_memory().await.unwrap();

        let report = ingest(&client(&transport), &store, &IngestOptions::default())
            .await
            .unwrap();

        assert_eq!(report.ack_cursor, Some(MessageId::new(200)));
        assert_eq!(report.acked_up_to(), 200);
        let ack = transport.last_request().unwrap();
        assert_eq!(ack.get_param("message"), Some("200"));
    }

    #[tokio::test]
    async fn zero_response_cursor_falls_back_to_max_id() {
        let transport = MockTransport::new();
        let mut reply = batch(&[7, 3]);
        reply["last"] = json!(0);
        transport.queue_json(200, reply);
        transport.queue_json(200, json!({"status": 1}));
        let store = SqliteStore::in_memory().await.unwrap();

        let report = ingest(&client(&transport), &store, &IngestOptions::default())
            .await
            .unwrap();
        assert_eq!(report.ack_cursor, Some(MessageId::new(7)));
    }

    #[tokio::test]
    async fn response_cursor_acks_even_without_messages() {
        let transport = MockTransport::new();
        let mut reply = batch(&[]);
        reply["last"] = json!(42);
        transport.queue_json(200, reply);
        transport.queue_json(200, json!({"status": 1}));
        let store = SqliteStore::in_memory().await.unwrap();

        let report = ingest(&client(&transport), &store, &IngestOptions::default())
            .await
            .unwrap();
        assert_eq!(report.acked_up_to(), 42);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn empty_fetch_makes_no_ack_call() {
        let transport = MockTransport::new();
        transport.queue_json(200, batch(&[]));
        let store = SqliteStore::in_memory().await.unwrap();

        let report = ingest(&client(&transport), &store, &IngestOptions::default())
            .await
            .unwrap();

        assert_eq!(report.fetched, 0);
        assert_eq!(report.ack_cursor, None);
        assert_eq!(report.acked_up_to(), 0);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn explicit_zero_cursor_uses_max_fetched() {
        let transport = MockTransport::new();
        transport.queue_json(200, batch(&[7, 3]));
        transport.queue_json(200, json!({"status": 1}));
        let store = SqliteStore::in_memory().await.unwrap();

        let options = IngestOptions::default().with_cursor(MessageId::new(0));
        let report = ingest(&client(&transport), &store, &options).await.unwrap();
        assert_eq!(report.ack_cursor, Some(MessageId::new(7)));
    }

    #[tokio::test]
    async fn explicit_cursor_acks_even_without_messages() {
        let transport = MockTransport::new();
        transport.queue_json(200, batch(&[]));
        transport.queue_json(200, json!({"status": 1}));
        let store = SqliteStore::in_memory().await.unwrap();

        let options = IngestOptions::default().with_cursor(MessageId::new(40));
        let report = ingest(&client(&transport), &store, &options).await.unwrap();
        assert_eq!(report.acked_up_to(), 40);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn persist_failure_is_warning_and_ack_still_happens() {
        let transport = MockTransport::new();
        transport.queue_json(200, batch(&[1, 2, 3]));
        transport.queue_json(200, json!({"status": 1}));

        let report = ingest(&client(&transport), &BrokenStore, &IngestOptions::default())
            .await
            .unwrap();

        assert_eq!(report.fetched, 3);
        assert_eq!(report.persisted, 0);
        assert!(report
            .persist_warning
            .as_deref()
            .unwrap()
            .contains("disk is read-only"));
        assert_eq!(report.ack_warning, None);
        assert_eq!(report.acked_up_to(), 3);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn ack_failure_is_independent_warning() {
        let transport = MockTransport::new();
        transport.queue_json(200, batch(&[10]));
        transport.queue_json(500, json!({"status": 0, "errors": ["internal"]}));
        let store = SqliteStore::in_memory().await.unwrap();

        let report = ingest(&client(&transport), &store, &IngestOptions::default())
            .await
            .unwrap();

        assert_eq!(report.persisted, 1);
        assert_eq!(report.persist_warning, None);
        assert!(report.ack_warning.is_some());
        assert_eq!(report.ack_cursor, Some(MessageId::new(10)));
        assert_eq!(report.acked_up_to(), 0);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_cycle() {
        let transport = MockTransport::new();
        transport.queue_failure(TransportError::Timeout);
        transport.queue_failure(TransportError::Timeout);
        let store = SqliteStore::in_memory().await.unwrap();

        let err = ingest(&client(&transport), &store, &IngestOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert!(store
            .query_messages(&HistoryQuery::new(10))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn limit_caps_returned_not_persisted() {
        let transport = MockTransport::new();
        transport.queue_json(200, batch(&[1, 2, 3, 4, 5]));
        transport.queue_json(200, json!({"status": 1}));
        let store = SqliteStore::in_memory().await.unwrap();

        let options = IngestOptions::default().with_limit(2);
        let report = ingest(&client(&transport), &store, &options).await.unwrap();

        assert_eq!(report.fetched, 5);
        assert_eq!(report.returned, 2);
        assert_eq!(report.messages.len(), 2);
        assert_eq!(report.persisted, 5);
        assert_eq!(report.acked_up_to(), 5);
    }

    #[tokio::test]
    async fn repeated_delivery_is_idempotent() {
        let transport = MockTransport::new();
        for _ in 0..2 {
            transport.queue_json(200, batch(&[1, 2]));
            transport.queue_json(200, json!({"status": 1}));
        }
        let store = SqliteStore::in_memory().await.unwrap();
        let c = client(&transport);

        ingest(&c, &store, &IngestOptions::default()).await.unwrap();
        let second = ingest(&c, &store, &IngestOptions::default()).await.unwrap();
        assert_eq!(second.persisted, 2);

        let stored = store.query_messages(&HistoryQuery::new(10)).await.unwrap();
        assert_eq!(stored.len(), 2);
    }
}
