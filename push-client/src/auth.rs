//! Login and device registration handshake driver.
//!
//! [`AuthHandshake`] interprets the push-core [`AuthState`] machine against
//! a [`PushClient`]. It holds the account password and the login secret so
//! the state machine never sees them.
//!
//! ```ignore
//! let mut hs = AuthHandshake::new(client, email, password);
//! if hs.submit().await? == LoginOutcome::TwoFactorRequired {
//!     hs.submit_code(&prompt("2FA code")?).await?;
//! }
//! let device = hs.register_device("laptop").await?;
//! ```

use crate::client::PushClient;
use crate::error::{ClientError, Result};
use crate::transport::Transport;
use push_core::{AuthEvent, AuthState};

/// Result of a login attempt that reached the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// A login secret is held. Register a device next.
    Authenticated,
    /// The service wants a two-factor code. Call `submit_code` next.
    TwoFactorRequired,
}

/// Credentials for receiving on a registered device.
#[derive(Clone, PartialEq, Eq)]
pub struct DeviceCredentials {
    /// Id to use for fetch and acknowledge.
    pub device_id: String,
    /// Secret to use for fetch and acknowledge.
    pub device_secret: String,
}

impl std::fmt::Debug for DeviceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceCredentials")
            .field("device_id", &self.device_id)
            .field("device_secret", &"[REDACTED]")
            .finish()
    }
}

/// Drives login, optional two-factor retry, and device registration.
pub struct AuthHandshake<T: Transport> {
    client: PushClient<T>,
    state: AuthState,
    email: String,
    password: String,
    secret: Option<String>,
    user_key: Option<String>,
}

impl<T: Transport> AuthHandshake<T> {
    /// Start a handshake for the given account.
    pub fn new(client: PushClient<T>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            client,
            state: AuthState::new(),
            email: email.into(),
            password: password.into(),
            secret: None,
            user_key: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// The account's user key, once a login has been accepted.
    pub fn user_key(&self) -> Option<&str> {
        self.user_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Submit email and password without a code.
    pub async fn submit(&mut self) -> Result<LoginOutcome> {
        if !matches!(self.state, AuthState::Start | AuthState::Failed { .. }) {
            return Err(ClientError::HandshakeOutOfOrder {
                expected: "a fresh or failed handshake",
            });
        }
        self.apply(AuthEvent::LoginRequested { with_code: false });
        self.attempt_login(None).await
    }

    /// Resubmit with the two-factor code the service asked for.
    pub async fn submit_code(&mut self, code: &str) -> Result<LoginOutcome> {
        if !self.state.awaiting_code() {
            return Err(ClientError::HandshakeOutOfOrder {
                expected: "a two-factor challenge",
            });
        }
        self.apply(AuthEvent::CodeProvided);
        self.attempt_login(Some(code)).await
    }

    /// Register a device using the login secret.
    ///
    /// The device id is the registration's `id`, falling back to its `name`
    /// and then to `name` as supplied. The device secret is the registration's
    /// own secret when it has one, otherwise the login secret.
    pub async fn register_device(&mut self, name: &str) -> Result<DeviceCredentials> {
        let secret = match (&self.secret, self.state.can_register()) {
            (Some(secret), true) => secret.clone(),
            _ => {
                return Err(ClientError::HandshakeOutOfOrder {
                    expected: "a successful login",
                })
            }
        };

        let reg = match self.client.register_device(&secret, name).await {
            Ok(reg) => reg,
            Err(e) => {
                self.apply(AuthEvent::RegistrationFailed {
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        let device_id = first_non_empty(&[reg.id.as_str(), reg.name.as_str(), name]);
        let device_secret = if reg.secret.is_empty() {
            secret
        } else {
            reg.secret
        };

        self.apply(AuthEvent::DeviceRegistered {
            device_id: device_id.clone(),
        });
        tracing::info!("registered device {}", device_id);

        Ok(DeviceCredentials {
            device_id,
            device_secret,
        })
    }

    async fn attempt_login(&mut self, code: Option<&str>) -> Result<LoginOutcome> {
        match self.client.login(&self.email, &self.password, code).await {
            Ok(session) => {
                self.secret = Some(session.secret);
                self.user_key = Some(session.user_key);
                self.apply(AuthEvent::LoginAccepted);
                Ok(LoginOutcome::Authenticated)
            }
            Err(ClientError::TwoFactorRequired) => {
                self.apply(AuthEvent::TwoFactorRequired);
                Ok(LoginOutcome::TwoFactorRequired)
            }
            Err(e) => {
                self.apply(AuthEvent::LoginRejected {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn apply(&mut self, event: AuthEvent) {
        let (next, actions) = std::mem::take(&mut self.state).on_event(event);
        tracing::debug!("auth state -> {:?}, next actions {:?}", next, actions);
        self.state = next;
    }
}

fn first_non_empty(candidates: &[&str]) -> String {
    candidates
        .iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}
