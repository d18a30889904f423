//! # Lifecycle events emitted by the orchestrator and its units.
//!
//! [`EventKind`] classifies events across the startup sequence (connecting,
//! scheduling, listener start) and the running phase (unit failures,
//! shutdown). [`Event`] carries the metadata: timestamps, unit or topic
//! names, and failure reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically; use it to restore order when events are observed out of
//! order.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Startup events ===
    /// The bus connection is being established.
    ///
    /// Sets: `detail` (client id).
    Connecting,

    /// The bus connection is established and all subscriptions are
    /// registered.
    ///
    /// Sets: `detail` (client id).
    Connected,

    /// A background unit (one-shot or interval task) was handed to the
    /// scheduler.
    ///
    /// Sets: `unit`, optionally `detail` (interval).
    UnitLaunched,

    /// The HTTP listener is up.
    ///
    /// Sets: `detail` (bind address).
    HttpStarted,

    // === Running-phase events ===
    /// A background unit exited cleanly (or observed cancellation).
    ///
    /// Sets: `unit`.
    UnitStopped,

    /// A background unit failed. Local to the unit; siblings keep running.
    ///
    /// Sets: `unit`, `reason`.
    UnitFailed,

    /// A message handler failed while processing one delivery.
    ///
    /// Sets: `topic`, `reason`.
    HandlerFailed,

    // === Shutdown events ===
    /// Termination signal observed; all units are being cancelled.
    ShutdownRequested,

    /// All units have stopped.
    AllStopped,
}

/// A lifecycle event with metadata.
///
/// Construct with [`Event::now`] and attach fields with the `with_*`
/// builders:
///
/// ```rust
/// use colony::{Event, EventKind};
///
/// let ev = Event::now(EventKind::UnitFailed)
///     .with_unit("ticker")
///     .with_reason("boom");
/// assert_eq!(ev.kind, EventKind::UnitFailed);
/// assert_eq!(ev.unit.as_deref(), Some("ticker"));
/// ```
#[derive(Debug, Clone)]
pub struct Event {
    /// Event classification.
    pub kind: EventKind,
    /// Background unit name, when relevant.
    pub unit: Option<String>,
    /// Bus topic, when relevant.
    pub topic: Option<String>,
    /// Failure reason or free-form detail for error events.
    pub reason: Option<String>,
    /// Free-form detail (client id, bind address, interval).
    pub detail: Option<String>,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Globally monotonic sequence number.
    pub seq: u64,
}

impl Event {
    /// Creates an event stamped with the current time and next sequence
    /// number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            kind,
            unit: None,
            topic: None,
            reason: None,
            detail: None,
            at: SystemTime::now(),
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
        }
    }

    /// Attaches a unit name.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Attaches a topic name.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Attaches a failure reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches free-form detail.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_attach_fields() {
        let ev = Event::now(EventKind::HandlerFailed)
            .with_topic("foo.x")
            .with_reason("bad payload");
        assert_eq!(ev.kind, EventKind::HandlerFailed);
        assert_eq!(ev.topic.as_deref(), Some("foo.x"));
        assert_eq!(ev.reason.as_deref(), Some("bad payload"));
        assert!(ev.unit.is_none());
    }

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::now(EventKind::Connecting);
        let b = Event::now(EventKind::Connected);
        assert!(b.seq > a.seq);
    }
}
