//! Conversion from wire types to store records.

use chrono::{DateTime, Utc};
use push_types::{MessageRecord, ReceivedMessage, SendParams, SendReceipt, SentRecord};

/// Convert a fetched batch into store records stamped with `received_at`.
///
/// The origin timestamp becomes `sent_at` only when it is positive.
pub fn from_received(messages: &[ReceivedMessage], received_at: DateTime<Utc>) -> Vec<MessageRecord> {
    messages
        .iter()
        .map(|m| MessageRecord {
            local_id: None,
            remote_id: m.id,
            umid: m.dedup_token().map(str::to_string),
            title: m.title.clone(),
            message: m.message.clone(),
            app: m.app.clone(),
            aid: m.aid,
            icon: m.icon.clone(),
            priority: m.priority,
            url: non_blank(m.url.as_deref()),
            url_title: non_blank(m.url_title.as_deref()),
            acked: m.acked,
            html: m.html,
            received_at,
            sent_at: if m.date > 0 {
                DateTime::from_timestamp(m.date, 0)
            } else {
                None
            },
        })
        .collect()
}

/// Build the log entry for a notification that was accepted by the service.
pub fn sent_record(params: &SendParams, receipt: &SendReceipt, sent_at: DateTime<Utc>) -> SentRecord {
    SentRecord {
        local_id: None,
        message: params.message.clone(),
        title: params.title.clone(),
        device: params.device.clone(),
        priority: params.priority,
        sent_at,
        request_id: receipt.request_id.clone(),
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.filter(|v| !v.is_empty()).map(str::to_string)
}
