//! # push-types
//!
//! Data model and wire types for the push notification sync client.
//!
//! This crate provides the foundational types used across all push crates:
//! - [`MessageId`], [`Priority`] - Identity and ordering types
//! - [`ReceivedMessage`] - A message as returned by the remote fetch
//! - [`MessageRecord`], [`SentRecord`] - Rows in the local store
//! - [`SendParams`], [`SendReceipt`] - Outbound notifications
//! - [`HistoryQuery`] - Filters for history lookups
//! - [`ValidationError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod messages;
mod query;
mod send;

pub use error::ValidationError;
pub use ids::{MessageId, Priority};
pub use messages::{MessageRecord, ReceivedMessage, SentRecord};
pub use query::{HistoryQuery, DEFAULT_HISTORY_LIMIT};
pub use send::{SendParams, SendReceipt};
