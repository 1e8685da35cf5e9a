//! Acknowledgment cursor computation.
//!
//! The service keeps a per-device high-water mark: acknowledging id `N`
//! deletes every message with id `<= N` from the device queue. The cursor
//! for a cycle is therefore the largest id that is known to be recorded.
//!
//! An explicit cursor supplied by the caller is combined with the ids
//! fetched in the same cycle by taking the maximum, so a fetched message is
//! never left unacknowledged because the caller passed a stale value.

use push_types::MessageId;

/// Compute the acknowledgment cursor for one ingestion cycle.
///
/// Returns `None` when there is nothing to acknowledge: no positive explicit
/// cursor and no positive fetched id.
pub fn ack_cursor<I>(explicit: Option<MessageId>, fetched: I) -> Option<MessageId>
where
    I: IntoIterator<Item = MessageId>,
{
    let highest_fetched = fetched.into_iter().filter(MessageId::is_valid).max();
    let explicit = explicit.filter(MessageId::is_valid);

    match (explicit, highest_fetched) {
        (Some(e), Some(f)) => Some(e.max(f)),
        (e, f) => e.or(f),
    }
}
