//! # push-client
//!
//! Client library for the Pushover Message API and Open Client API.
//!
//! ## Features
//!
//! - **Bounded Concurrency**: At most two requests in flight per client, shared by every clone
//! - **Flat Retry**: Network failures are retried after a fixed delay; API errors never are
//! - **Cancellation**: Every call races a [`CancellationToken`](tokio_util::sync::CancellationToken)
//! - **Transport Abstraction**: Pluggable HTTP layer (reqwest, mock)
//! - **Pure State Machine**: The login handshake is driven by push-core
//!
//! ## Example
//!
//! ```ignore
//! use push_client::{ingest, ClientConfig, Credentials, IngestOptions, PushClient};
//! use push_store::SqliteStore;
//!
//! let client = PushClient::with_http(ClientConfig::default(), credentials)?;
//! let store = SqliteStore::new(&db_path).await?;
//!
//! let report = ingest(&client, &store, &IngestOptions::default()).await?;
//! println!("{} new, acked up to {}", report.fetched, report.acked_up_to());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod client;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod ingest;
pub mod response;
pub mod transport;

pub use auth::{AuthHandshake, DeviceCredentials, LoginOutcome};
pub use client::{DeviceRegistration, DeviceSummary, FetchResult, LoginSession, PushClient};
pub use config::ClientConfig;
pub use credentials::Credentials;
pub use dispatch::Dispatcher;
pub use error::{ApiError, ClientError, Result};
pub use ingest::{ingest, IngestOptions, IngestReport};
pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, MockTransport, Transport, TransportError,
};
