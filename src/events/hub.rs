//! # Broadcast hub for lifecycle events.
//!
//! [`EventHub`] is a thin wrapper around [`tokio::sync::broadcast`] that
//! lets many publishers (the orchestrator, task units, the bus client)
//! emit [`Event`]s without blocking, and any number of subscribers observe
//! them.
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks or awaits.
//! - **Bounded capacity**: one ring buffer of recent events is shared by
//!   all receivers; slow receivers observe `RecvError::Lagged` and skip
//!   the oldest items.
//! - **No persistence**: events published while no receiver exists are
//!   dropped.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for lifecycle events.
///
/// Cheap to clone (the sender is `Arc`-backed); publishing from a plain OS
/// thread is fine because `publish` is synchronous.
#[derive(Clone, Debug)]
pub struct EventHub {
    tx: broadcast::Sender<Event>,
}

impl EventHub {
    /// Creates a hub with the given ring-buffer capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active subscribers.
    ///
    /// If there are no receivers the event is dropped; this still returns
    /// immediately.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new independent receiver observing subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventHub {
    /// A hub with a 1024-event ring buffer.
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let hub = EventHub::new(8);
        let mut rx = hub.subscribe();
        hub.publish(Event::now(EventKind::Connecting).with_detail("client-1"));
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::Connecting);
        assert_eq!(ev.detail.as_deref(), Some("client-1"));
    }

    #[test]
    fn test_publish_without_receivers_is_a_noop() {
        let hub = EventHub::new(1);
        hub.publish(Event::now(EventKind::AllStopped));
    }
}
