//! Queue synchronization: cursors and the poll/accept protocol.
//!
//! Each of the four append-only streams carries a client-side cursor — the
//! server-assigned identifier of the newest item the client has seen. The
//! cursor is advanced only from the metadata of a poll response carrying
//! items; it is never counted locally, never advanced on an empty result,
//! never persisted, and read back by accept. A mismatched or failed poll
//! response is logged and yields an empty item list rather than an error.

use scorelink_wire::{QueueKind, ResponseEnvelope};
use tracing::{error, warn};

use crate::codec::Codec;

/// Cursor store for the four queue streams.
#[derive(Debug, Default)]
pub struct QueueTracker {
    cursors: [Option<i64>; 4],
}

impl QueueTracker {
    /// Fresh tracker with every stream in the never-polled state.
    #[must_use]
    pub const fn new() -> Self {
        Self { cursors: [None; 4] }
    }

    /// Last-seen queue item id for the stream, or `None` before the first
    /// successful poll.
    #[must_use]
    pub const fn cursor(&self, kind: QueueKind) -> Option<i64> {
        self.cursors[Self::index(kind)]
    }

    fn record_delivery(&mut self, kind: QueueKind, last_queue_item_id: i64) {
        self.cursors[Self::index(kind)] = Some(last_queue_item_id);
    }

    const fn index(kind: QueueKind) -> usize {
        match kind {
            QueueKind::Results => 0,
            QueueKind::PlayerData => 1,
            QueueKind::Participations => 2,
            QueueKind::Handrecords => 3,
        }
    }
}

/// Extracts the item list from a poll response and advances the cursor.
///
/// The response must report success and carry the data kind of the polled
/// stream; anything else is logged and yields an empty list. The cursor is
/// set to the server-reported `last_queue_item_id` only when items arrived.
pub(crate) fn items_from_poll<K: Codec>(
    codec: &K,
    kind: QueueKind,
    envelope: &ResponseEnvelope,
    tracker: &mut QueueTracker,
) -> Vec<String> {
    if !envelope.succeeded() {
        warn!(
            target: "scorelink::sync",
            stream = %kind,
            error_kind = %envelope.error_kind,
            "poll failed"
        );
        return Vec::new();
    }
    if envelope.data_kind != kind.data_kind() {
        error!(
            target: "scorelink::sync",
            stream = %kind,
            expected = %kind.data_kind(),
            received = %envelope.data_kind,
            "poll response carried the wrong data kind"
        );
        return Vec::new();
    }
    if envelope.payload.trim().is_empty() {
        return Vec::new();
    }
    let items: Vec<String> = match codec.decode(&envelope.payload) {
        Ok(items) => items,
        Err(failure) => {
            error!(
                target: "scorelink::sync",
                stream = %kind,
                %failure,
                "poll payload failed to decode"
            );
            return Vec::new();
        }
    };
    if !items.is_empty() {
        tracker.record_delivery(kind, envelope.last_queue_item_id);
    }
    items
}

#[cfg(test)]
mod tests {
    use scorelink_wire::{CommandKind, DataKind, ErrorKind};

    use super::*;
    use crate::codec::JsonCodec;

    fn poll_envelope(data_kind: DataKind, last_id: i64, items: &[&str]) -> ResponseEnvelope {
        ResponseEnvelope {
            request_command: CommandKind::PollNewResults,
            data_kind,
            error_kind: ErrorKind::None,
            last_queue_item_id: last_id,
            correlation_key: String::from("191-1-3062"),
            payload: serde_json::to_string(items).expect("encode items"),
        }
    }

    #[test]
    fn delivery_advances_cursor_to_server_reported_id() {
        let mut tracker = QueueTracker::new();
        let envelope = poll_envelope(DataKind::Results, 42, &["r1", "r2", "r3"]);
        let items = items_from_poll(&JsonCodec, QueueKind::Results, &envelope, &mut tracker);
        assert_eq!(items.len(), 3);
        assert_eq!(tracker.cursor(QueueKind::Results), Some(42));
    }

    #[test]
    fn empty_delivery_leaves_cursor_untouched() {
        let mut tracker = QueueTracker::new();
        tracker.record_delivery(QueueKind::Results, 42);
        // A spurious empty response reporting a stale id must not regress
        // the cursor.
        let envelope = poll_envelope(DataKind::Results, 7, &[]);
        let items = items_from_poll(&JsonCodec, QueueKind::Results, &envelope, &mut tracker);
        assert!(items.is_empty());
        assert_eq!(tracker.cursor(QueueKind::Results), Some(42));
    }

    #[test]
    fn wrong_data_kind_yields_empty_list_without_cursor_motion() {
        let mut tracker = QueueTracker::new();
        let envelope = poll_envelope(DataKind::PlayerData, 42, &["r1"]);
        let items = items_from_poll(&JsonCodec, QueueKind::Results, &envelope, &mut tracker);
        assert!(items.is_empty());
        assert_eq!(tracker.cursor(QueueKind::Results), None);
    }

    #[test]
    fn failed_poll_yields_empty_list() {
        let mut tracker = QueueTracker::new();
        let mut envelope = poll_envelope(DataKind::Results, 42, &["r1"]);
        envelope.error_kind = ErrorKind::EntryUnknown;
        let items = items_from_poll(&JsonCodec, QueueKind::Results, &envelope, &mut tracker);
        assert!(items.is_empty());
        assert_eq!(tracker.cursor(QueueKind::Results), None);
    }

    #[test]
    fn undecodable_payload_yields_empty_list() {
        let mut tracker = QueueTracker::new();
        let mut envelope = poll_envelope(DataKind::Results, 42, &[]);
        envelope.payload = String::from("not a list");
        let items = items_from_poll(&JsonCodec, QueueKind::Results, &envelope, &mut tracker);
        assert!(items.is_empty());
        assert_eq!(tracker.cursor(QueueKind::Results), None);
    }

    #[test]
    fn cursors_are_independent_per_stream() {
        let mut tracker = QueueTracker::new();
        tracker.record_delivery(QueueKind::Results, 42);
        tracker.record_delivery(QueueKind::Handrecords, 7);
        assert_eq!(tracker.cursor(QueueKind::Results), Some(42));
        assert_eq!(tracker.cursor(QueueKind::PlayerData), None);
        assert_eq!(tracker.cursor(QueueKind::Participations), None);
        assert_eq!(tracker.cursor(QueueKind::Handrecords), Some(7));
    }
}
