//! Configuration management for push.

use anyhow::{Context, Result};
use push_client::{ClientConfig, Credentials, HttpTransport, PushClient};
use push_types::Priority;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings stored in `config.toml`.
///
/// Empty strings mean "not configured".
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application API token.
    pub app_token: String,
    /// User or group key to send to.
    pub user_key: String,
    /// Device id from `push login`.
    pub device_id: String,
    /// Device secret from `push login`.
    pub device_secret: String,
    /// Device to target when `send` names none.
    pub default_device: String,
    /// Priority to use when `send` names none.
    pub default_priority: i64,
    /// API base URL override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Config {
    /// Load the config, or the default config if the file does not exist.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read config {}", path.display()))
            }
        };
        toml::from_str(&contents).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Save the config, readable by the owner only.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to encode config")?;
        let tmp = path.with_extension("toml.tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .context("Failed to write config")?;
        set_file_permissions_0600(&tmp).await?;
        tokio::fs::rename(&tmp, path)
            .await
            .context("Failed to save config")?;
        Ok(())
    }

    /// Client credentials built from this config.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.app_token.trim(), self.user_key.trim())
            .with_device(self.device_id.trim(), self.device_secret.trim())
    }

    /// Check that the config can send.
    pub fn validate_send(&self) -> Result<()> {
        self.credentials().ensure_send()?;
        Ok(())
    }

    /// Check that the config can receive.
    pub fn validate_receive(&self) -> Result<()> {
        self.validate_send()?;
        if !self.has_device() {
            anyhow::bail!("device credentials missing, run 'push login'");
        }
        Ok(())
    }

    /// Whether a device is registered.
    pub fn has_device(&self) -> bool {
        !self.device_id.trim().is_empty() && !self.device_secret.trim().is_empty()
    }

    /// Forget the registered device. App credentials are kept.
    pub fn clear_device(&mut self) {
        self.device_id.clear();
        self.device_secret.clear();
    }

    /// The configured default priority, clamped into range.
    pub fn default_priority(&self) -> Priority {
        let clamped = self.default_priority.clamp(Priority::MIN, Priority::MAX);
        Priority::try_from(clamped).unwrap_or(Priority::NORMAL)
    }

    /// Client settings, honoring the base URL override.
    pub fn client_config(&self) -> ClientConfig {
        match self.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => ClientConfig::default().with_base_url(url),
            _ => ClientConfig::default(),
        }
    }

    /// An HTTP client for this config.
    pub fn client(&self) -> Result<PushClient<HttpTransport>> {
        PushClient::with_http(self.client_config(), self.credentials())
            .context("Failed to create API client")
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("app_token", &"[REDACTED]")
            .field("user_key", &"[REDACTED]")
            .field("device_id", &self.device_id)
            .field("device_secret", &"[REDACTED]")
            .field("default_device", &self.default_device)
            .field("default_priority", &self.default_priority)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Set file permissions to 0600 (owner read/write only) on Unix.
/// No-op on non-Unix platforms.
async fn set_file_permissions_0600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .context("Failed to set file permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}
