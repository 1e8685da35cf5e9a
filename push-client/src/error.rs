//! Client error taxonomy.
//!
//! Variants are grouped by how a caller should react: fix the input
//! (precondition), try again later (transport), read the service's message
//! (API), or ask the user for a second factor.

use crate::transport::TransportError;
use push_types::ValidationError;
use std::fmt;
use thiserror::Error;

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    // ----- Precondition -----
    /// No application token configured.
    #[error("app token not configured")]
    MissingAppToken,

    /// No user key configured.
    #[error("user key not configured")]
    MissingUserKey,

    /// Receiving requires a registered device.
    #[error("device credentials missing")]
    MissingDeviceCredentials,

    /// Email or password was blank.
    #[error("email and password are required")]
    EmptyCredentials,

    /// Device registration needs a login secret.
    #[error("login secret is required")]
    MissingSecret,

    /// Device registration needs a name.
    #[error("device name is required")]
    MissingDeviceName,

    /// Input rejected before any network call.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    // ----- Network -----
    /// Network-level failure. The only retryable kind.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    // ----- Application -----
    /// The service answered with an error status.
    #[error(transparent)]
    Api(ApiError),

    /// The service asked for a two-factor code (HTTP 412).
    #[error("two-factor authentication code required")]
    TwoFactorRequired,

    /// The service answered successfully but broke its own contract.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Response body was not the expected JSON.
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    /// Configured base URL cannot carry a path.
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    /// A handshake step was called in the wrong order.
    #[error("handshake out of order: expected {expected}")]
    HandshakeOutOfOrder {
        /// The step that must come first.
        expected: &'static str,
    },

    /// The caller's cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,
}

impl ClientError {
    /// Whether the error was raised before any network call.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingAppToken
                | Self::MissingUserKey
                | Self::MissingDeviceCredentials
                | Self::EmptyCredentials
                | Self::MissingSecret
                | Self::MissingDeviceName
                | Self::Invalid(_)
        )
    }

    /// Whether the service is asking for a two-factor code.
    pub fn is_two_factor(&self) -> bool {
        matches!(self, Self::TwoFactorRequired)
    }

    /// Whether the dispatcher would retry this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// An error status returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Status from the body, or the HTTP status when the body has none.
    pub status: i64,
    /// Request id, for support tickets.
    pub request_id: String,
    /// Human-readable reasons.
    pub messages: Vec<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pushover API error (status {})", self.status)?;
        if !self.messages.is_empty() {
            write!(f, ": {}", self.messages.join("; "))?;
        }
        if !self.request_id.is_empty() {
            write!(f, " [request {}]", self.request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}
