//! Query stored messages and sent notifications.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use push_core::parse_time_filter;
use push_store::{MessageStore, SqliteStore};
use push_types::{HistoryQuery, MessageRecord, SentRecord};
use std::path::Path;

/// Filters given on the command line.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub limit: i64,
    pub since: Option<String>,
    pub until: Option<String>,
    pub search: Option<String>,
    pub sent: bool,
}

impl HistoryFilter {
    /// Resolve time filters into a store query.
    pub fn to_query(&self) -> Result<HistoryQuery> {
        let mut query = HistoryQuery::new(self.limit);
        if let Some(since) = &self.since {
            query = query.with_since(parse_bound("--since", since)?);
        }
        if let Some(until) = &self.until {
            query = query.with_until(parse_bound("--until", until)?);
        }
        if let Some(search) = &self.search {
            query = query.with_search(search.as_str());
        }
        Ok(query)
    }
}

fn parse_bound(flag: &str, value: &str) -> Result<DateTime<Utc>> {
    parse_time_filter(value).with_context(|| format!("Invalid {flag} value '{value}'"))
}

/// Run the history command.
pub async fn run(db_path: &Path, filter: &HistoryFilter, json: bool) -> Result<()> {
    let query = filter.to_query()?;
    let store = SqliteStore::new(db_path)
        .await
        .context("Failed to open message database")?;

    if filter.sent {
        let rows = store.query_sent(&query).await;
        store.close().await;
        let rows = rows.context("Failed to query sent history")?;
        if json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        } else if rows.is_empty() {
            println!("No sent notifications.");
        } else {
            for row in &rows {
                println!("{}", format_sent(row));
            }
        }
    } else {
        let rows = store.query_messages(&query).await;
        store.close().await;
        let rows = rows.context("Failed to query message history")?;
        if json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        } else if rows.is_empty() {
            println!("No messages.");
        } else {
            for row in &rows {
                println!("{}", format_record(row));
            }
        }
    }
    Ok(())
}

fn local(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// One-line rendering of a stored message.
pub fn format_record(record: &MessageRecord) -> String {
    let at = record.sent_at.as_ref().unwrap_or(&record.received_at);
    let mut line = format!("[{}] {} ", record.remote_id, local(at));
    if !record.title.is_empty() {
        line.push_str(&record.title);
        line.push_str(": ");
    }
    line.push_str(&record.message);
    line
}

/// One-line rendering of a sent notification.
pub fn format_sent(record: &SentRecord) -> String {
    let mut line = format!("{} ", local(&record.sent_at));
    if let Some(device) = &record.device {
        line.push_str(&format!("-> {device} "));
    }
    if let Some(title) = &record.title {
        line.push_str(title);
        line.push_str(": ");
    }
    line.push_str(&record.message);
    line
}
