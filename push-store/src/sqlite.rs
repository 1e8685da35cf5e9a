//! SQLite storage backend for push-store.

use crate::error::{Result, StoreError};
use crate::MessageStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use push_types::{HistoryQuery, MessageId, MessageRecord, Priority, SentRecord};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;

/// SQLite-based message store.
///
/// Uses WAL mode for concurrent reads/writes. Timestamps are stored as Unix
/// milliseconds.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the store at `path`, creating parent directories.
    pub async fn new(path: &Path) -> Result<Self> {
        if path.as_os_str().is_empty() || path.is_dir() {
            return Err(StoreError::InvalidPath {
                path: path.to_path_buf(),
            });
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        tracing::debug!("opened message store at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .synchronous(SqliteSynchronous::Normal);

        // A single connection that never recycles, or the database vanishes.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                remote_id INTEGER NOT NULL UNIQUE,
                umid TEXT,
                title TEXT NOT NULL DEFAULT '',
                message TEXT NOT NULL,
                app TEXT NOT NULL DEFAULT '',
                aid INTEGER NOT NULL DEFAULT 0,
                icon TEXT NOT NULL DEFAULT '',
                priority INTEGER NOT NULL DEFAULT 0,
                url TEXT,
                url_title TEXT,
                acked INTEGER NOT NULL DEFAULT 0,
                html INTEGER NOT NULL DEFAULT 0,
                received_at INTEGER NOT NULL,
                sent_at INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Migration(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sent (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                message TEXT NOT NULL,
                title TEXT,
                device TEXT,
                priority INTEGER NOT NULL DEFAULT 0,
                sent_at INTEGER NOT NULL,
                request_id TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Migration(e.to_string()))?;

        // Create indexes
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_received ON messages(received_at)")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sent_sent_at ON sent(sent_at)")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.pool.is_closed() {
            Err(StoreError::NotInitialized)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn persist_messages(&self, records: &[MessageRecord]) -> Result<usize> {
        self.ensure_open()?;
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        for r in records {
            sqlx::query(
                r#"
                INSERT INTO messages (
                    remote_id, umid, title, message, app, aid, icon, priority,
                    url, url_title, acked, html, received_at, sent_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                ON CONFLICT(remote_id) DO UPDATE SET
                    umid = excluded.umid,
                    title = excluded.title,
                    message = excluded.message,
                    app = excluded.app,
                    aid = excluded.aid,
                    icon = excluded.icon,
                    priority = excluded.priority,
                    url = excluded.url,
                    url_title = excluded.url_title,
                    acked = excluded.acked,
                    html = excluded.html,
                    received_at = excluded.received_at,
                    sent_at = excluded.sent_at
                "#,
            )
            .bind(r.remote_id.value())
            .bind(r.umid.as_deref())
            .bind(&r.title)
            .bind(&r.message)
            .bind(&r.app)
            .bind(r.aid)
            .bind(&r.icon)
            .bind(r.priority.value())
            .bind(r.url.as_deref())
            .bind(r.url_title.as_deref())
            .bind(r.acked)
            .bind(r.html)
            .bind(r.received_at.timestamp_millis())
            .bind(r.sent_at.map(|t| t.timestamp_millis()))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!("persisted {} messages", records.len());
        Ok(records.len())
    }

    async fn log_sent(&self, record: &SentRecord) -> Result<i64> {
        self.ensure_open()?;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sent (message, title, device, priority, sent_at, request_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id
            "#,
        )
        .bind(&record.message)
        .bind(record.title.as_deref())
        .bind(record.device.as_deref())
        .bind(record.priority.value())
        .bind(record.sent_at.timestamp_millis())
        .bind(&record.request_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn query_messages(&self, query: &HistoryQuery) -> Result<Vec<MessageRecord>> {
        self.ensure_open()?;
        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"
            SELECT id, remote_id, umid, title, message, app, aid, icon, priority,
                   url, url_title, acked, html, received_at, sent_at
            FROM messages
            WHERE (?1 IS NULL OR received_at >= ?1)
              AND (?2 IS NULL OR received_at <= ?2)
              AND (?3 IS NULL OR message LIKE ?3 ESCAPE '\' OR title LIKE ?3 ESCAPE '\')
            ORDER BY received_at DESC, id DESC
            LIMIT ?4
            "#,
        )
        .bind(query.since.map(|t| t.timestamp_millis()))
        .bind(query.until.map(|t| t.timestamp_millis()))
        .bind(query.search.as_deref().map(like_pattern))
        .bind(query.effective_limit())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MessageRecord::try_from).collect()
    }

    async fn query_sent(&self, query: &HistoryQuery) -> Result<Vec<SentRecord>> {
        self.ensure_open()?;
        let rows: Vec<SentRow> = sqlx::query_as(
            r#"
            SELECT id, message, title, device, priority, sent_at, request_id
            FROM sent
            WHERE (?1 IS NULL OR sent_at >= ?1)
              AND (?2 IS NULL OR sent_at <= ?2)
              AND (?3 IS NULL OR message LIKE ?3 ESCAPE '\' OR title LIKE ?3 ESCAPE '\')
            ORDER BY sent_at DESC, id DESC
            LIMIT ?4
            "#,
        )
        .bind(query.since.map(|t| t.timestamp_millis()))
        .bind(query.until.map(|t| t.timestamp_millis()))
        .bind(query.search.as_deref().map(like_pattern))
        .bind(query.effective_limit())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SentRecord::try_from).collect()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Build a `LIKE` pattern matching `term` anywhere, escaping wildcards.
fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

fn millis_to_time(id: i64, millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| StoreError::InvalidRow {
        id,
        reason: format!("timestamp {millis} out of range"),
    })
}

fn stored_priority(id: i64, raw: i64) -> Result<Priority> {
    Priority::try_from(raw).map_err(|e| StoreError::InvalidRow {
        id,
        reason: e.to_string(),
    })
}

/// Internal row type for the messages table.
#[derive(sqlx::FromRow)]
struct MessageRow {
    id: i64,
    remote_id: i64,
    umid: Option<String>,
    title: String,
    message: String,
    app: String,
    aid: i64,
    icon: String,
    priority: i64,
    url: Option<String>,
    url_title: Option<String>,
    acked: bool,
    html: bool,
    received_at: i64,
    sent_at: Option<i64>,
}

impl TryFrom<MessageRow> for MessageRecord {
    type Error = StoreError;

    fn try_from(row: MessageRow) -> Result<Self> {
        Ok(MessageRecord {
            local_id: Some(row.id),
            remote_id: MessageId::new(row.remote_id),
            umid: row.umid,
            title: row.title,
            message: row.message,
            app: row.app,
            aid: row.aid,
            icon: row.icon,
            priority: stored_priority(row.id, row.priority)?,
            url: row.url,
            url_title: row.url_title,
            acked: row.acked,
            html: row.html,
            received_at: millis_to_time(row.id, row.received_at)?,
            sent_at: row
                .sent_at
                .map(|ms| millis_to_time(row.id, ms))
                .transpose()?,
        })
    }
}

/// Internal row type for the sent table.
#[derive(sqlx::FromRow)]
struct SentRow {
    id: i64,
    message: String,
    title: Option<String>,
    device: Option<String>,
    priority: i64,
    sent_at: i64,
    request_id: String,
}

impl TryFrom<SentRow> for SentRecord {
    type Error = StoreError;

    fn try_from(row: SentRow) -> Result<Self> {
        Ok(SentRecord {
            local_id: Some(row.id),
            message: row.message,
            title: row.title,
            device: row.device,
            priority: stored_priority(row.id, row.priority)?,
            sent_at: millis_to_time(row.id, row.sent_at)?,
            request_id: row.request_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn base_time() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn record(remote_id: i64, body: &str, received_at: DateTime<Utc>) -> MessageRecord {
        MessageRecord {
            local_id: None,
            remote_id: MessageId::new(remote_id),
            umid: Some(format!("u{remote_id}")),
            title: String::new(),
            message: body.to_string(),
            app: "tests".into(),
            aid: 1,
            icon: String::new(),
            priority: Priority::NORMAL,
            url: None,
            url_title: None,
            acked: false,
            html: false,
            received_at,
            sent_at: None,
        }
    }

    fn sent(body: &str, at: DateTime<Utc>) -> SentRecord {
        SentRecord {
            local_id: None,
            message: body.to_string(),
            title: Some("title".into()),
            device: None,
            priority: Priority::try_from(1).unwrap(),
            sent_at: at,
            request_id: "req".into(),
        }
    }

    // ===========================================
    // Persistence Tests
    // ===========================================

    #[tokio::test]
    async fn persist_and_query_roundtrip() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut r = record(100, "hello", base_time());
        r.sent_at = Some(base_time() - TimeDelta::seconds(30));
        r.url = Some("https://example.com".into());
        r.html = true;

        assert_eq!(store.persist_messages(&[r.clone()]).await.unwrap(), 1);

        let rows = store.query_messages(&HistoryQuery::new(10)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].local_id.is_some());
        let mut expected = r;
        expected.local_id = rows[0].local_id;
        assert_eq!(rows[0], expected);
    }

    #[tokio::test]
    async fn duplicate_ingest_is_idempotent_and_overwrites() {
        let store = SqliteStore::in_memory().await.unwrap();
        let batch = vec![
            record(1, "first", base_time()),
            record(2, "second", base_time()),
        ];
        store.persist_messages(&batch).await.unwrap();

        let mut updated = batch.clone();
        updated[1].message = "second (edited)".into();
        updated[1].acked = true;
        assert_eq!(store.persist_messages(&updated).await.unwrap(), 2);

        let rows = store.query_messages(&HistoryQuery::new(100)).await.unwrap();
        assert_eq!(rows.len(), 2);
        let second = rows
            .iter()
            .find(|r| r.remote_id == MessageId::new(2))
            .unwrap();
        assert_eq!(second.message, "second (edited)");
        assert!(second.acked);
    }

    #[tokio::test]
    async fn repeated_identity_within_batch_keeps_last_values() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut later = record(1, "b", base_time());
        later.title = "later".into();
        let batch = vec![record(1, "a", base_time()), later];

        for _ in 0..2 {
            assert_eq!(store.persist_messages(&batch).await.unwrap(), 2);
        }

        let rows = store.query_messages(&HistoryQuery::new(100)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].remote_id, MessageId::new(1));
        assert_eq!(rows[0].message, "b");
        assert_eq!(rows[0].title, "later");
    }

    #[tokio::test]
    async fn empty_batch_is_noop() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert_eq!(store.persist_messages(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn file_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("push.db");
        let store = SqliteStore::new(&path).await.unwrap();
        store
            .persist_messages(&[record(5, "on disk", base_time())])
            .await
            .unwrap();
        store.close().await;

        let reopened = SqliteStore::new(&path).await.unwrap();
        let rows = reopened.query_messages(&HistoryQuery::new(0)).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn directory_path_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = SqliteStore::new(dir.path()).await.err().unwrap();
        assert!(matches!(err, StoreError::InvalidPath { .. }));
    }

    // ===========================================
    // Query Tests
    // ===========================================

    #[tokio::test]
    async fn search_with_limit_returns_newest_matches() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut batch = Vec::new();
        let mut matching = Vec::new();
        for i in 0..20i64 {
            let at = base_time() + TimeDelta::minutes(i);
            let mut r = record(i + 1, "all good", at);
            if i % 3 == 2 {
                // Alternate body and title matches, mixed case.
                if i % 2 == 0 {
                    r.message = "disk error on /var".into();
                } else {
                    r.title = "Build ERROR".into();
                }
                matching.push(i + 1);
            }
            batch.push(r);
        }
        assert_eq!(matching.len(), 6);
        store.persist_messages(&batch).await.unwrap();

        let query = HistoryQuery::new(5).with_search("error");
        let rows = store.query_messages(&query).await.unwrap();

        let ids: Vec<i64> = rows.iter().map(|r| r.remote_id.value()).collect();
        let expected: Vec<i64> = matching.iter().rev().copied().take(5).collect();
        assert_eq!(ids, vec![18, 15, 12, 9, 6]);
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn zero_limit_uses_default() {
        let store = SqliteStore::in_memory().await.unwrap();
        let batch: Vec<_> = (1..=30)
            .map(|i| record(i, "m", base_time() + TimeDelta::seconds(i)))
            .collect();
        store.persist_messages(&batch).await.unwrap();

        let rows = store.query_messages(&HistoryQuery::new(0)).await.unwrap();
        assert_eq!(rows.len(), 20);
        assert_eq!(rows[0].remote_id, MessageId::new(30));
    }

    #[tokio::test]
    async fn since_and_until_bound_receipt_time() {
        let store = SqliteStore::in_memory().await.unwrap();
        let batch: Vec<_> = (0..5)
            .map(|i| record(i + 1, "m", base_time() + TimeDelta::hours(i)))
            .collect();
        store.persist_messages(&batch).await.unwrap();

        let query = HistoryQuery::new(10)
            .with_since(base_time() + TimeDelta::hours(1))
            .with_until(base_time() + TimeDelta::hours(3));
        let ids: Vec<i64> = store
            .query_messages(&query)
            .await
            .unwrap()
            .iter()
            .map(|r| r.remote_id.value())
            .collect();
        assert_eq!(ids, vec![4, 3, 2]);
    }

    #[tokio::test]
    async fn search_escapes_wildcards() {
        let store = SqliteStore::in_memory().await.unwrap();
        store
            .persist_messages(&[
                record(1, "disk 100% full", base_time()),
                record(2, "disk 1000 full", base_time()),
            ])
            .await
            .unwrap();

        let rows = store
            .query_messages(&HistoryQuery::new(10).with_search("100%"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].remote_id, MessageId::new(1));
    }

    #[test]
    fn like_pattern_escapes() {
        assert_eq!(like_pattern("a_b%c\\"), "%a\\_b\\%c\\\\%");
    }

    // ===========================================
    // Sent Log Tests
    // ===========================================

    #[tokio::test]
    async fn sent_record_time_window() {
        let store = SqliteStore::in_memory().await.unwrap();
        let at = base_time() + TimeDelta::milliseconds(123);
        let id = store.log_sent(&sent("deployed", at)).await.unwrap();
        assert!(id > 0);

        let exact = HistoryQuery::new(10).with_since(at).with_until(at);
        let rows = store.query_sent(&exact).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].local_id, Some(id));
        assert_eq!(rows[0].sent_at, at);
        assert_eq!(rows[0].title.as_deref(), Some("title"));

        let after = HistoryQuery::new(10).with_since(at + TimeDelta::milliseconds(1));
        assert!(store.query_sent(&after).await.unwrap().is_empty());

        let before = HistoryQuery::new(10).with_until(at - TimeDelta::milliseconds(1));
        assert!(store.query_sent(&before).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sent_log_is_append_only() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.log_sent(&sent("one", base_time())).await.unwrap();
        store.log_sent(&sent("one", base_time())).await.unwrap();
        let rows = store.query_sent(&HistoryQuery::new(10)).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    // ===========================================
    // Lifecycle Tests
    // ===========================================

    #[tokio::test]
    async fn closed_store_reports_not_initialized() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.close().await;

        let err = store.persist_messages(&[]).await.unwrap_err();
        assert!(matches!(err, StoreError::NotInitialized));
        let err = store
            .query_messages(&HistoryQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotInitialized));
        let err = store.log_sent(&sent("x", base_time())).await.unwrap_err();
        assert!(matches!(err, StoreError::NotInitialized));
    }
}
