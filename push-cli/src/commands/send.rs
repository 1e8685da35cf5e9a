//! Send a notification.

use anyhow::{Context, Result};
use chrono::Utc;
use push_core::sent_record;
use push_store::{MessageStore, SqliteStore};
use push_types::{Priority, SendParams, SendReceipt};
use std::path::Path;

use crate::config::Config;
use crate::SendArgs;

/// Run the send command.
pub async fn run(config_path: &Path, db_path: &Path, args: SendArgs) -> Result<()> {
    let config = Config::load(config_path).await?;
    config.validate_send()?;

    let params = build_params(&config, args)?;
    let client = config.client()?;
    let receipt = client
        .send(&params)
        .await
        .context("Failed to send notification")?;

    let warning = match SqliteStore::new(db_path).await {
        Ok(store) => {
            let warning = record_sent(&store, &params, &receipt).await;
            store.close().await;
            warning
        }
        Err(e) => Some(format!("could not open history database: {e}")),
    };
    if let Some(warning) = warning {
        eprintln!("warning: {warning}");
    }

    println!("✓ Notification sent. Request ID: {}", receipt.request_id);
    if let Some(receipt) = &receipt.receipt {
        println!("  Receipt: {}", receipt);
    }
    Ok(())
}

/// Turn command-line arguments into send parameters, applying config
/// defaults for device and priority.
pub fn build_params(config: &Config, args: SendArgs) -> Result<SendParams> {
    let priority = match args.priority {
        Some(p) => Priority::try_from(p)?,
        None => config.default_priority(),
    };
    let device = args
        .device
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| config.default_device.trim().to_string());

    let mut params = SendParams::new(args.message.join(" "))
        .with_priority(priority)
        .with_device(device)
        .with_html(args.html)
        .with_monospace(args.monospace);
    if let Some(title) = args.title {
        params = params.with_title(title);
    }
    if let Some(url) = args.url {
        params = params.with_url(url, args.url_title);
    }
    if let Some(sound) = args.sound {
        params = params.with_sound(sound);
    }
    params.validate()?;
    Ok(params)
}

/// Log a sent notification. Returns a warning instead of failing.
pub async fn record_sent<S>(store: &S, params: &SendParams, receipt: &SendReceipt) -> Option<String>
where
    S: MessageStore + ?Sized,
{
    let record = sent_record(params, receipt, Utc::now());
    match store.log_sent(&record).await {
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("failed to log sent notification: {}", e);
            Some(format!("notification sent but not logged: {e}"))
        }
    }
}
