//! Login and device registration state machine.
//!
//! This module provides a pure, side-effect-free state machine for the
//! account login and device registration handshake. The state machine takes
//! events as input and produces a new state plus a list of actions to execute.
//!
//! The actual HTTP calls are performed by push-client, not by this module.
//!
//! ```text
//! Start ──login──▶ LoginSubmitted ──ok──────────────────────▶ LoginSucceeded
//!                        │                                        │
//!                        └─412─▶ TwoFactorChallenged              │ registered
//!                                   │       ▲                     ▼
//!                                 code     412              DeviceRegistered
//!                                   ▼       │
//!                             LoginRetriedWithCode ──ok──▶ LoginSucceeded
//! ```
//!
//! Secrets never enter the state machine. The driver holds them.

/// Handshake state - NO I/O, just state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Nothing submitted yet.
    Start,
    /// Credentials sent, awaiting the service.
    LoginSubmitted,
    /// The service asked for a second factor.
    TwoFactorChallenged,
    /// Credentials plus code sent, awaiting the service.
    LoginRetriedWithCode,
    /// The service returned a login secret.
    LoginSucceeded,
    /// A device is registered and the client can receive.
    DeviceRegistered {
        /// Identifier to use for receive calls.
        device_id: String,
    },
    /// The login was rejected.
    Failed {
        /// Reason reported by the service.
        error: String,
    },
}

impl AuthState {
    /// Create a new state machine in the Start state.
    pub fn new() -> Self {
        Self::Start
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// Invalid transitions leave the state unchanged and produce no actions.
    pub fn on_event(self, event: AuthEvent) -> (Self, Vec<AuthAction>) {
        match (self, event) {
            // Submitting (or resubmitting after a rejection)
            (Self::Start | Self::Failed { .. }, AuthEvent::LoginRequested { with_code }) => (
                Self::LoginSubmitted,
                vec![AuthAction::SendLogin { with_code }],
            ),

            // Two-factor challenge, including a rejected code
            (Self::LoginSubmitted | Self::LoginRetriedWithCode, AuthEvent::TwoFactorRequired) => (
                Self::TwoFactorChallenged,
                vec![AuthAction::PromptForCode],
            ),
            (Self::TwoFactorChallenged, AuthEvent::CodeProvided) => (
                Self::LoginRetriedWithCode,
                vec![AuthAction::SendLogin { with_code: true }],
            ),

            // Login outcome
            (Self::LoginSubmitted | Self::LoginRetriedWithCode, AuthEvent::LoginAccepted) => {
                (Self::LoginSucceeded, vec![AuthAction::RegisterDevice])
            }
            (Self::LoginSubmitted | Self::LoginRetriedWithCode, AuthEvent::LoginRejected { error }) => (
                Self::Failed {
                    error: error.clone(),
                },
                vec![AuthAction::ReportFailure { error }],
            ),

            // Registration
            (Self::LoginSucceeded, AuthEvent::DeviceRegistered { device_id }) => (
                Self::DeviceRegistered { device_id },
                vec![AuthAction::SaveCredentials],
            ),
            (Self::LoginSucceeded, AuthEvent::RegistrationFailed { error }) => {
                (Self::LoginSucceeded, vec![AuthAction::ReportFailure { error }])
            }

            (_, AuthEvent::Reset) => (Self::Start, vec![]),

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Whether a login secret is held and a device may be registered.
    pub fn can_register(&self) -> bool {
        matches!(self, Self::LoginSucceeded)
    }

    /// Whether the service is waiting for a second factor.
    pub fn awaiting_code(&self) -> bool {
        matches!(self, Self::TwoFactorChallenged)
    }

    /// Whether the handshake has finished successfully.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::DeviceRegistered { .. })
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events that can occur during the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// User submitted email and password.
    LoginRequested {
        /// Whether a two-factor code was supplied up front.
        with_code: bool,
    },
    /// Service answered with HTTP 412.
    TwoFactorRequired,
    /// User supplied a two-factor code.
    CodeProvided,
    /// Service returned a login secret.
    LoginAccepted,
    /// Service rejected the login.
    LoginRejected {
        /// Reason reported by the service.
        error: String,
    },
    /// Service registered the device.
    DeviceRegistered {
        /// Identifier to use for receive calls.
        device_id: String,
    },
    /// Service rejected the registration.
    RegistrationFailed {
        /// Reason reported by the service.
        error: String,
    },
    /// Abandon the handshake.
    Reset,
}

/// Actions to be executed by the handshake driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAction {
    /// Call the login endpoint.
    SendLogin {
        /// Include the two-factor code.
        with_code: bool,
    },
    /// Ask the user for a two-factor code.
    PromptForCode,
    /// Call the device registration endpoint.
    RegisterDevice,
    /// Persist the device credentials.
    SaveCredentials,
    /// Surface a failure to the user.
    ReportFailure {
        /// Reason reported by the service.
        error: String,
    },
}
