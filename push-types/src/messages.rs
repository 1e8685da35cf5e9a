//! Inbound and stored message types.
//!
//! The fetch endpoint is loose about its encoding: flags arrive as `0`/`1`
//! integers or booleans, the dedup token may come as a number (`umid`) or a
//! string (`umid_str`), and the origin time is called `date` by the live
//! service but `timestamp` in older payloads. The deserializers here accept
//! all of those forms.

use crate::{MessageId, Priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A message as returned by the remote fetch. Transient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedMessage {
    /// Remote identity (monotonically increasing).
    pub id: MessageId,
    /// Opaque dedup token, numeric form.
    #[serde(default, deserialize_with = "de_opt_token")]
    pub umid: Option<String>,
    /// Opaque dedup token, string form. Preferred over `umid` when present.
    #[serde(default, deserialize_with = "de_opt_token", skip_serializing)]
    pub umid_str: Option<String>,
    /// Message title.
    #[serde(default)]
    pub title: String,
    /// Message body.
    #[serde(default)]
    pub message: String,
    /// Origin application name.
    #[serde(default)]
    pub app: String,
    /// Origin application id.
    #[serde(default)]
    pub aid: i64,
    /// Application icon name.
    #[serde(default)]
    pub icon: String,
    /// Delivery priority.
    #[serde(default, deserialize_with = "de_priority_lenient")]
    pub priority: Priority,
    /// Supplementary URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Title for the supplementary URL.
    #[serde(default)]
    pub url_title: Option<String>,
    /// Whether an emergency message has been acknowledged.
    #[serde(default, deserialize_with = "de_flag")]
    pub acked: bool,
    /// Whether the body contains HTML.
    #[serde(default, deserialize_with = "de_flag")]
    pub html: bool,
    /// Origin time in epoch seconds. Zero when unknown.
    #[serde(default, alias = "timestamp")]
    pub date: i64,
}

impl ReceivedMessage {
    /// Dedup token, preferring the string form.
    pub fn dedup_token(&self) -> Option<&str> {
        self.umid_str
            .as_deref()
            .or(self.umid.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// A received message as held in the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Local sequence id. `None` until persisted.
    pub local_id: Option<i64>,
    /// Remote identity. Unique in the store.
    pub remote_id: MessageId,
    /// Dedup token.
    pub umid: Option<String>,
    /// Message title.
    pub title: String,
    /// Message body.
    pub message: String,
    /// Origin application name.
    pub app: String,
    /// Origin application id.
    pub aid: i64,
    /// Application icon name.
    pub icon: String,
    /// Delivery priority.
    pub priority: Priority,
    /// Supplementary URL.
    pub url: Option<String>,
    /// Title for the supplementary URL.
    pub url_title: Option<String>,
    /// Acknowledged flag.
    pub acked: bool,
    /// HTML body flag.
    pub html: bool,
    /// When this client recorded the message.
    pub received_at: DateTime<Utc>,
    /// When the origin sent it, if known.
    pub sent_at: Option<DateTime<Utc>>,
}

/// An outbound notification as logged locally. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentRecord {
    /// Local sequence id. `None` until persisted.
    pub local_id: Option<i64>,
    /// Notification body.
    pub message: String,
    /// Notification title.
    pub title: Option<String>,
    /// Target device, if not all devices.
    pub device: Option<String>,
    /// Priority sent with the notification.
    pub priority: Priority,
    /// When this client sent it.
    pub sent_at: DateTime<Utc>,
    /// Request id returned by the service.
    pub request_id: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Int(i64),
}

fn de_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Option::<FlagRepr>::deserialize(d)? {
        Some(FlagRepr::Bool(b)) => b,
        Some(FlagRepr::Int(i)) => i != 0,
        None => false,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TokenRepr {
    Str(String),
    Int(i64),
}

fn de_opt_token<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<TokenRepr>::deserialize(d)? {
        Some(TokenRepr::Str(s)) => Some(s),
        Some(TokenRepr::Int(i)) => Some(i.to_string()),
        None => None,
    })
}

fn de_priority_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<Priority, D::Error> {
    let raw = Option::<i64>::deserialize(d)?.unwrap_or(0);
    let clamped = raw.clamp(Priority::MIN, Priority::MAX);
    Priority::try_from(clamped).map_err(serde::de::Error::custom)
}
