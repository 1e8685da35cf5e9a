//! PushClient - the main interface to the notification service.
//!
//! # Architecture
//!
//! ```text
//! Application → PushClient → Dispatcher → Transport → Network
//!                              (permits, retry, cancel)
//! ```
//!
//! A `PushClient` is cheap to clone. Clones share one [`Dispatcher`], so
//! the concurrency limit covers every operation issued through any of them.
//! [`PushClient::with_cancellation`] gives a handle with its own token.

use crate::config::ClientConfig;
use crate::credentials::Credentials;
use crate::dispatch::Dispatcher;
use crate::error::{ClientError, Result};
use crate::response::decode_json;
use crate::transport::{HttpRequest, HttpTransport, Transport};
use push_types::{MessageId, ReceivedMessage, SendParams, SendReceipt};
use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Platform tag sent on device registration. `O` is the open client type.
const DEVICE_OS: &str = "O";

/// The main push client.
pub struct PushClient<T: Transport> {
    dispatcher: Arc<Dispatcher<T>>,
    base_url: Url,
    max_attempts: u32,
    credentials: Credentials,
    cancel: CancellationToken,
}

impl<T: Transport> Clone for PushClient<T> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            base_url: self.base_url.clone(),
            max_attempts: self.max_attempts,
            credentials: self.credentials.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl PushClient<HttpTransport> {
    /// Create a client over real HTTP.
    pub fn with_http(config: ClientConfig, credentials: Credentials) -> Result<Self> {
        let transport = HttpTransport::new(config.timeout)?;
        Self::new(config, credentials, transport)
    }
}

impl<T: Transport> PushClient<T> {
    /// Create a client over `transport`.
    pub fn new(config: ClientConfig, credentials: Credentials, transport: T) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.base_url));
        }

        Ok(Self {
            dispatcher: Arc::new(Dispatcher::new(transport, &config)),
            base_url,
            max_attempts: config.max_attempts,
            credentials,
            cancel: CancellationToken::new(),
        })
    }

    /// A handle sharing this client's dispatcher but cancelled by `token`.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancel: token,
            ..self.clone()
        }
    }

    /// A handle sharing this client's dispatcher with other credentials.
    pub fn with_credentials(&self, credentials: Credentials) -> Self {
        Self {
            credentials,
            ..self.clone()
        }
    }

    /// Credentials used by this handle.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The shared dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    /// Send a notification.
    pub async fn send(&self, params: &SendParams) -> Result<SendReceipt> {
        self.credentials.ensure_send()?;
        params.validate()?;

        let url = self.endpoint(&["messages.json"])?;
        let creds = &self.credentials;
        let build = || {
            let mut req = HttpRequest::post(url.clone())
                .param("token", creds.app_token.as_str())
                .param("user", creds.user_key.as_str())
                .param("message", params.message.as_str())
                .param_opt("title", params.title.as_deref())
                .param_opt("device", params.device.as_deref())
                .param_opt("url", params.url.as_deref())
                .param_opt("url_title", params.url_title.as_deref())
                .param_opt("sound", params.sound.as_deref());
            if !params.priority.is_normal() {
                req = req.param("priority", params.priority.to_string());
            }
            if let Some(ts) = params.timestamp {
                req = req.param("timestamp", ts.timestamp().to_string());
            }
            if params.html {
                req = req.param("html", "1");
            }
            if params.monospace {
                req = req.param("monospace", "1");
            }
            Ok(req)
        };

        let response = self.dispatch(build).await?;
        let body: SendResponse = decode_json(&response)?;
        Ok(SendReceipt {
            request_id: body.request,
            receipt: body.receipt.filter(|r| !r.is_empty()),
        })
    }

    /// Log in with account credentials, optionally with a two-factor code.
    ///
    /// Fails with [`ClientError::TwoFactorRequired`] when the account needs
    /// a code and none (or a wrong one) was given. Never retries that case.
    pub async fn login(&self, email: &str, password: &str, code: Option<&str>) -> Result<LoginSession> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ClientError::EmptyCredentials);
        }

        let url = self.endpoint(&["users", "login.json"])?;
        let build = || {
            Ok(HttpRequest::post(url.clone())
                .param("email", email.trim())
                .param("password", password)
                .param_opt("code", code.map(str::trim)))
        };

        let response = self.dispatch(build).await?;
        let body: LoginResponse = decode_json(&response)?;
        if body.secret.is_empty() {
            return Err(ClientError::Protocol("login did not return a secret".into()));
        }
        Ok(LoginSession {
            secret: body.secret,
            user_key: body.id,
            devices: body.devices,
        })
    }

    /// Register this client as a device under the logged-in account.
    pub async fn register_device(&self, secret: &str, name: &str) -> Result<DeviceRegistration> {
        if secret.is_empty() {
            return Err(ClientError::MissingSecret);
        }
        if name.trim().is_empty() {
            return Err(ClientError::MissingDeviceName);
        }

        let url = self.endpoint(&["devices.json"])?;
        let build = || {
            Ok(HttpRequest::post(url.clone())
                .param("secret", secret)
                .param("name", name.trim())
                .param("os", DEVICE_OS))
        };

        let response = self.dispatch(build).await?;
        decode_json(&response)
    }

    /// Fetch every message waiting for this device.
    pub async fn fetch_messages(&self) -> Result<FetchResult> {
        self.credentials.ensure_receive()?;

        let url = self.endpoint(&["messages.json"])?;
        let creds = &self.credentials;
        let build = || {
            Ok(HttpRequest::get(url.clone())
                .param("secret", creds.device_secret.as_str())
                .param("device_id", creds.device_id.as_str()))
        };

        let response = self.dispatch(build).await?;
        let body: FetchResponse = decode_json(&response)?;
        Ok(FetchResult {
            messages: body.messages,
            last: (body.last > 0).then(|| MessageId::new(body.last)),
            request_id: body.request,
        })
    }

    /// Delete every message with id `<= up_to` from this device's queue.
    pub async fn acknowledge(&self, up_to: MessageId) -> Result<()> {
        self.credentials.ensure_receive()?;
        let up_to = MessageId::positive(up_to.value())?;

        let creds = &self.credentials;
        let url = self.endpoint(&[
            "devices",
            creds.device_id.as_str(),
            "update_highest_message.json",
        ])?;
        let build = || {
            Ok(HttpRequest::post(url.clone())
                .param("secret", creds.device_secret.as_str())
                .param("message", up_to.to_string()))
        };

        let response = self.dispatch(build).await?;
        let _: StatusResponse = decode_json(&response)?;
        Ok(())
    }

    async fn dispatch<F>(&self, build: F) -> Result<crate::transport::HttpResponse>
    where
        F: FnMut() -> Result<HttpRequest> + Send,
    {
        self.dispatcher
            .execute(build, self.max_attempts, &self.cancel)
            .await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// One fetch of the device's unread queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResult {
    /// Unread messages, oldest first.
    pub messages: Vec<ReceivedMessage>,
    /// Highest message id the service reports for the device, if any.
    pub last: Option<MessageId>,
    /// Request id of the fetch.
    pub request_id: String,
}

/// A successful login.
#[derive(Clone)]
pub struct LoginSession {
    /// Session secret used to register devices.
    pub secret: String,
    /// The account's user key, when the service returns it.
    pub user_key: String,
    /// Devices already registered on the account.
    pub devices: Vec<DeviceSummary>,
}

impl std::fmt::Debug for LoginSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginSession")
            .field("secret", &"[REDACTED]")
            .field("devices", &self.devices)
            .finish()
    }
}

/// A device listed on the account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceSummary {
    /// Device id.
    #[serde(default)]
    pub id: String,
    /// Device name.
    #[serde(default)]
    pub name: String,
}

/// Device registration result.
#[derive(Clone, Default, Deserialize)]
pub struct DeviceRegistration {
    /// Request id.
    #[serde(default)]
    pub request: String,
    /// Assigned device id. May be empty.
    #[serde(default)]
    pub id: String,
    /// Device-specific secret. May be empty.
    #[serde(default)]
    pub secret: String,
    /// Registered name. May be empty.
    #[serde(default)]
    pub name: String,
}

impl std::fmt::Debug for DeviceRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistration")
            .field("request", &self.request)
            .field("id", &self.id)
            .field("secret", &"[REDACTED]")
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Deserialize)]
struct SendResponse {
    #[serde(default)]
    request: String,
    #[serde(default)]
    receipt: Option<String>,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    secret: String,
    #[serde(default)]
    id: String,
    #[serde(default, deserialize_with = "de_devices")]
    devices: Vec<DeviceSummary>,
}

#[derive(Deserialize)]
struct FetchResponse {
    #[serde(default)]
    request: String,
    #[serde(default)]
    messages: Vec<ReceivedMessage>,
    #[serde(default)]
    last: i64,
}

#[derive(Deserialize)]
struct StatusResponse {}

/// Device lists come back as objects or as bare names.
fn de_devices<'de, D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Vec<DeviceSummary>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entry {
        Full(DeviceSummary),
        Name(String),
    }
    let entries = Option::<Vec<Entry>>::deserialize(d)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .map(|e| match e {
            Entry::Full(d) => d,
            Entry::Name(name) => DeviceSummary {
                id: String::new(),
                name,
            },
        })
        .collect())
}
