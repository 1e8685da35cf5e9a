//! Fetch new messages, store them, and mark them read.

use anyhow::{Context, Result};
use chrono::DateTime;
use push_client::{ingest, IngestOptions, IngestReport};
use push_store::{MessageStore, SqliteStore};
use push_types::ReceivedMessage;
use std::path::Path;

use crate::config::Config;

/// Messages shown when no positive limit is given.
pub const DEFAULT_DISPLAY_LIMIT: usize = 10;

/// Replace a zero or negative limit with the default.
pub fn display_limit(limit: i64) -> usize {
    match usize::try_from(limit) {
        Ok(n) if n > 0 => n,
        _ => DEFAULT_DISPLAY_LIMIT,
    }
}

/// Run the messages command.
pub async fn run(config_path: &Path, db_path: &Path, limit: i64, json: bool) -> Result<()> {
    let config = Config::load(config_path).await?;
    config.validate_receive()?;

    let client = config.client()?;
    let store = SqliteStore::new(db_path)
        .await
        .context("Failed to open message database")?;

    let options = IngestOptions::default().with_limit(display_limit(limit));
    let report = ingest(&client, &store, &options)
        .await
        .context("Failed to fetch messages")?;
    store.close().await;

    print_warnings(&report);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.messages.is_empty() {
        println!("No new messages.");
    } else {
        for message in &report.messages {
            println!("{}", format_message(message));
        }
        if report.fetched > report.returned {
            println!("({} more stored, see 'push history')", report.fetched - report.returned);
        }
    }
    Ok(())
}

fn print_warnings(report: &IngestReport) {
    for warning in [&report.persist_warning, &report.ack_warning]
        .into_iter()
        .flatten()
    {
        eprintln!("warning: {warning}");
    }
}

/// One-line rendering of a received message.
pub fn format_message(message: &ReceivedMessage) -> String {
    let when = DateTime::from_timestamp(message.date, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let title = if message.title.is_empty() {
        message.app.as_str()
    } else {
        message.title.as_str()
    };

    let mut line = format!("[{}] {} ", message.id, when);
    if !title.is_empty() {
        line.push_str(title);
        line.push_str(": ");
    }
    line.push_str(&message.message);
    if let Some(url) = message.url.as_deref().filter(|u| !u.is_empty()) {
        line.push_str(&format!(" <{url}>"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(json: serde_json::Value) -> ReceivedMessage {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn non_positive_limit_uses_default() {
        assert_eq!(display_limit(0), DEFAULT_DISPLAY_LIMIT);
        assert_eq!(display_limit(-5), DEFAULT_DISPLAY_LIMIT);
        assert_eq!(display_limit(3), 3);
    }

    #[test]
    fn format_with_title() {
        let m = message(serde_json::json!({
            "id": 42,
            "title": "Backup",
            "message": "done",
            "app": "cron",
            "date": 1_700_000_000
        }));
        assert_eq!(format_message(&m), "[42] 2023-11-14 22:13 Backup: done");
    }

    #[test]
    fn format_falls_back_to_app_name() {
        let m = message(serde_json::json!({
            "id": 7,
            "message": "ping",
            "app": "monitor",
            "date": 0,
            "url": "https://status.example.com"
        }));
        assert_eq!(
            format_message(&m),
            "[7] 1970-01-01 00:00 monitor: ping <https://status.example.com>"
        );
    }

    #[test]
    fn format_without_title_or_app() {
        let m = message(serde_json::json!({"id": 1, "message": "bare", "date": 0}));
        assert_eq!(format_message(&m), "[1] 1970-01-01 00:00 bare");
    }
}
