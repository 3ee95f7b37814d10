//! Live-connection registry.
//!
//! Maps a recipient id to its single live event sink. Owned by the
//! process's composition root and injected into handlers; rebuilt from
//! zero on restart. Each subscription gets a monotonically increasing
//! serial so a late close from an older connection cannot clobber a newer
//! subscribe for the same recipient.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::models::notify::NotificationEvent;

/// Buffered events per sink before a slow client is dropped.
const SINK_CAPACITY: usize = 32;

struct LiveSink {
    serial: u64,
    tx: mpsc::Sender<NotificationEvent>,
}

/// A live subscription handed back to the transport layer.
pub struct Subscription {
    /// Serial to pass back to [`LiveRegistry::unsubscribe`] on close.
    pub serial: u64,
    pub receiver: mpsc::Receiver<NotificationEvent>,
}

/// Registry of currently connected recipients.
pub struct LiveRegistry {
    sinks: DashMap<Uuid, LiveSink>,
    next_serial: AtomicU64,
}

impl LiveRegistry {
    pub fn new() -> Self {
        Self {
            sinks: DashMap::new(),
            next_serial: AtomicU64::new(1),
        }
    }

    /// Register a live sink for `recipient`, replacing any previous one.
    ///
    /// The replaced sender is dropped, which closes the old connection's
    /// receiver; at most one sink per recipient exists at any instant.
    pub fn subscribe(&self, recipient: Uuid) -> Subscription {
        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        let (tx, receiver) = mpsc::channel(SINK_CAPACITY);
        self.sinks.insert(recipient, LiveSink { serial, tx });
        debug!(%recipient, serial, "live connection registered");
        Subscription { serial, receiver }
    }

    /// Remove the mapping, but only if `serial` still identifies the
    /// registered sink. A stale close after a newer subscribe is a no-op.
    pub fn unsubscribe(&self, recipient: Uuid, serial: u64) {
        let removed = self
            .sinks
            .remove_if(&recipient, |_, sink| sink.serial == serial);
        if removed.is_some() {
            debug!(%recipient, serial, "live connection removed");
        }
    }

    /// Best-effort push to the recipient's live sink, if any.
    ///
    /// The sender is cloned out of the map so the send happens outside the
    /// shard lock and can never block it. A closed or full sink is treated
    /// as an implicit unsubscribe. Returns whether the event was handed to
    /// a live connection.
    pub fn push(&self, recipient: Uuid, event: NotificationEvent) -> bool {
        let (serial, tx) = match self.sinks.get(&recipient) {
            Some(sink) => (sink.serial, sink.tx.clone()),
            None => return false,
        };

        match tx.try_send(event) {
            Ok(()) => true,
            Err(_) => {
                // Dead or backed-up client; prune unless already replaced.
                self.unsubscribe(recipient, serial);
                false
            }
        }
    }

    /// Whether a recipient currently has a live sink.
    pub fn is_connected(&self, recipient: Uuid) -> bool {
        self.sinks.contains_key(&recipient)
    }

    /// Number of currently connected recipients.
    pub fn connected_count(&self) -> usize {
        self.sinks.len()
    }
}

impl Default for LiveRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notify::NotificationKind;

    fn event() -> NotificationEvent {
        NotificationEvent {
            kind: NotificationKind::ItemDone,
            payload: serde_json::json!({"title": "t"}),
        }
    }

    #[tokio::test]
    async fn push_reaches_the_subscribed_sink() {
        let registry = LiveRegistry::new();
        let recipient = Uuid::new_v4();
        let mut sub = registry.subscribe(recipient);

        assert!(registry.push(recipient, event()));
        let received = sub.receiver.recv().await.expect("event");
        assert_eq!(received.kind, NotificationKind::ItemDone);
    }

    #[tokio::test]
    async fn push_without_subscriber_is_a_no_op() {
        let registry = LiveRegistry::new();
        assert!(!registry.push(Uuid::new_v4(), event()));
    }

    #[tokio::test]
    async fn second_subscribe_replaces_the_first() {
        let registry = LiveRegistry::new();
        let recipient = Uuid::new_v4();

        let mut first = registry.subscribe(recipient);
        let mut second = registry.subscribe(recipient);

        assert!(registry.push(recipient, event()));
        assert!(second.receiver.recv().await.is_some());
        // The first connection's sender was dropped on replacement.
        assert!(first.receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn stale_unsubscribe_does_not_clobber_newer_connection() {
        let registry = LiveRegistry::new();
        let recipient = Uuid::new_v4();

        let old = registry.subscribe(recipient);
        let _new = registry.subscribe(recipient);

        // The old connection closes late; the newer sink must survive.
        registry.unsubscribe(recipient, old.serial);
        assert!(registry.is_connected(recipient));
    }

    #[tokio::test]
    async fn dead_sink_is_pruned_on_push() {
        let registry = LiveRegistry::new();
        let recipient = Uuid::new_v4();

        let sub = registry.subscribe(recipient);
        drop(sub.receiver);

        assert!(!registry.push(recipient, event()));
        assert!(!registry.is_connected(recipient));
    }

    #[tokio::test]
    async fn unsubscribe_with_matching_serial_removes() {
        let registry = LiveRegistry::new();
        let recipient = Uuid::new_v4();

        let sub = registry.subscribe(recipient);
        registry.unsubscribe(recipient, sub.serial);
        assert!(!registry.is_connected(recipient));
        assert_eq!(registry.connected_count(), 0);
    }
}
