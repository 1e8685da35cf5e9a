//! Acknowledge messages up to an id.

use anyhow::{Context, Result};
use push_client::{PushClient, Transport};
use push_types::MessageId;
use std::path::Path;

use crate::config::Config;

/// Run the mark-read command.
pub async fn run(config_path: &Path, id: i64) -> Result<()> {
    let up_to = MessageId::positive(id)?;
    let config = Config::load(config_path).await?;
    config.validate_receive()?;

    mark_read(&config.client()?, up_to).await?;
    println!("✓ Marked messages up to {} as read.", up_to);
    Ok(())
}

/// Acknowledge every message with id `<= up_to`.
pub async fn mark_read<T: Transport>(client: &PushClient<T>, up_to: MessageId) -> Result<()> {
    client
        .acknowledge(up_to)
        .await
        .with_context(|| format!("Failed to mark messages up to {up_to} as read"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use push_client::{ClientConfig, Credentials, MockTransport};
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn acknowledges_through_device_endpoint() {
        let transport = MockTransport::new();
        transport.queue_json(200, json!({"status": 1}));
        let client = PushClient::new(
            ClientConfig::default().with_base_url("https://api.example.com/1"),
            Credentials::new("tok", "usr").with_device("dev1", "dsec"),
            transport.clone(),
        )
        .unwrap();

        mark_read(&client, MessageId::new(55)).await.unwrap();

        let req = transport.last_request().unwrap();
        assert_eq!(req.url.path(), "/1/devices/dev1/update_highest_message.json");
        assert_eq!(req.get_param("message"), Some("55"));
        assert_eq!(req.get_param("secret"), Some("dsec"));
    }

    #[tokio::test]
    async fn non_positive_id_rejected_before_config() {
        let dir = tempdir().unwrap();
        let err = run(&dir.path().join("config.toml"), 0).await.unwrap_err();
        assert!(err.to_string().contains("must be positive"));
    }

    #[tokio::test]
    async fn requires_login() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config {
            app_token: "tok".into(),
            user_key: "usr".into(),
            ..Config::default()
        }
        .save(&path)
        .await
        .unwrap();

        let err = run(&path, 10).await.unwrap_err();
        assert!(err.to_string().contains("push login"));
    }
}
