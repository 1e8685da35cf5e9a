//! API credentials and the checks run before any network call.

use crate::error::{ClientError, Result};

/// Application and device credentials.
///
/// Empty strings mean "not configured".
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Application API token.
    pub app_token: String,
    /// User (or group) key.
    pub user_key: String,
    /// Registered device id, for receiving.
    pub device_id: String,
    /// Device secret, for receiving.
    pub device_secret: String,
}

impl Credentials {
    /// Credentials that can send but not receive.
    pub fn new(app_token: impl Into<String>, user_key: impl Into<String>) -> Self {
        Self {
            app_token: app_token.into(),
            user_key: user_key.into(),
            ..Self::default()
        }
    }

    /// Attach device credentials.
    pub fn with_device(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.device_id = id.into();
        self.device_secret = secret.into();
        self
    }

    /// Check that sending is possible.
    pub fn ensure_send(&self) -> Result<()> {
        if self.app_token.trim().is_empty() {
            return Err(ClientError::MissingAppToken);
        }
        if self.user_key.trim().is_empty() {
            return Err(ClientError::MissingUserKey);
        }
        Ok(())
    }

    /// Check that receiving is possible.
    pub fn ensure_receive(&self) -> Result<()> {
        self.ensure_send()?;
        if self.device_id.trim().is_empty() || self.device_secret.trim().is_empty() {
            return Err(ClientError::MissingDeviceCredentials);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("app_token", &redact(&self.app_token))
            .field("user_key", &redact(&self.user_key))
            .field("device_id", &self.device_id)
            .field("device_secret", &redact(&self.device_secret))
            .finish()
    }
}

fn redact(s: &str) -> &'static str {
    if s.is_empty() {
        "<unset>"
    } else {
        "[REDACTED]"
    }
}
