//! Outbound notification types.

use crate::{Priority, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parameters for an outbound notification.
///
/// Only `message` is required. Unset options are omitted from the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendParams {
    /// Notification body.
    pub message: String,
    /// Title shown above the body.
    pub title: Option<String>,
    /// Target a single device instead of all of the user's devices.
    pub device: Option<String>,
    /// Delivery priority. Normal priority is not sent.
    pub priority: Priority,
    /// Supplementary URL.
    pub url: Option<String>,
    /// Title for the supplementary URL.
    pub url_title: Option<String>,
    /// Notification sound name.
    pub sound: Option<String>,
    /// Override the displayed send time.
    pub timestamp: Option<DateTime<Utc>>,
    /// Render the body as HTML.
    pub html: bool,
    /// Render the body in a monospace font.
    pub monospace: bool,
}

impl SendParams {
    /// Create params for the given body.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = non_empty(title.into());
        self
    }

    /// Set the target device.
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = non_empty(device.into());
        self
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the supplementary URL and optional title.
    pub fn with_url(mut self, url: impl Into<String>, title: Option<String>) -> Self {
        self.url = non_empty(url.into());
        self.url_title = title.and_then(non_empty);
        self
    }

    /// Set the sound.
    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = non_empty(sound.into());
        self
    }

    /// Set the displayed send time.
    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }

    /// Render the body as HTML.
    pub fn with_html(mut self, html: bool) -> Self {
        self.html = html;
        self
    }

    /// Render the body in a monospace font.
    pub fn with_monospace(mut self, monospace: bool) -> Self {
        self.monospace = monospace;
        self
    }

    /// Reject params the service would refuse.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.message.trim().is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        Ok(())
    }
}

/// Result of a successful send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    /// Request id assigned by the service.
    pub request_id: String,
    /// Receipt for emergency-priority messages.
    pub receipt: Option<String>,
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_rejected() {
        assert_eq!(
            SendParams::new("   ").validate(),
            Err(ValidationError::EmptyMessage)
        );
        assert!(SendParams::new("hello").validate().is_ok());
    }

    #[test]
    fn empty_options_stay_unset() {
        let p = SendParams::new("x")
            .with_title("")
            .with_device("")
            .with_url("https://example.com", Some(String::new()));
        assert_eq!(p.title, None);
        assert_eq!(p.device, None);
        assert_eq!(p.url.as_deref(), Some("https://example.com"));
        assert_eq!(p.url_title, None);
    }
}
