//! # Message-bus client contract.
//!
//! The runtime consumes the bus through a narrow contract: connect with a
//! finalized [`BusConfig`], publish JSON payloads, and have delivered
//! messages dispatched to the registered handlers as
//! `(topic, message) → result`. The wire protocol, reconnection state
//! machine, and queue-group semantics live entirely behind the
//! implementation.
//!
//! Implementations:
//! - [`NatsBus`]: NATS-backed client (`nats` feature);
//! - [`MemoryBus`]: in-process bus for tests and standalone runs.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{AppConfig, Strategy};
use crate::error::{DeliveryError, RuntimeError};
use crate::events::EventHub;
use crate::identity::ServiceIdentity;
use crate::topics::Subscriptions;

#[cfg(feature = "nats")]
mod nats;
#[cfg(feature = "nats")]
pub use nats::NatsBus;

mod memory;
pub use memory::MemoryBus;

/// Finalized bus-client configuration.
///
/// Owned by the orchestrator and passed by value into [`BusClient::connect`]
/// exactly once. The subscription map is final by then: the client must
/// subscribe to exactly these topics and nothing else, so messages on
/// filtered-out topics are never delivered to the process at all.
pub struct BusConfig {
    /// Broker host.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Unique client id (from the resolved [`ServiceIdentity`]).
    pub client_id: String,
    /// Final topic→handler bindings. No further mutation after connect.
    pub subscriptions: Subscriptions,
    /// Topics this client publishes to.
    pub publish_topics: Vec<String>,
    /// Whether to reconnect after a lost connection.
    pub allow_reconnect: bool,
    /// Queue group for load-balanced delivery. Empty = none.
    pub queue_group: String,
    /// Reconnect attempts before giving up.
    pub max_reconnect_attempts: usize,
    /// Pause between reconnect attempts.
    pub reconnect_wait: Duration,
    /// Process concurrency strategy (read by the client for consumer setup).
    pub strategy: Strategy,
    /// Parallel queue consumers per topic, threaded strategy only.
    pub num_queues: usize,
    /// Lifecycle hub; the client reports failed deliveries here.
    pub events: EventHub,
}

impl BusConfig {
    /// Assembles the bus configuration from the app config, the resolved
    /// identity, the final subscription map, and the lifecycle hub.
    pub fn assemble(
        cfg: &AppConfig,
        identity: &ServiceIdentity,
        subscriptions: Subscriptions,
        events: EventHub,
    ) -> Self {
        Self {
            host: cfg.host.clone(),
            port: cfg.port,
            client_id: identity.client_id().to_string(),
            subscriptions,
            publish_topics: cfg.publish_topics.clone(),
            allow_reconnect: cfg.allow_reconnect,
            queue_group: cfg.queue_group.clone(),
            max_reconnect_attempts: cfg.max_reconnect_attempts,
            reconnect_wait: cfg.reconnect_wait,
            strategy: cfg.strategy,
            num_queues: cfg.num_queues_clamped(),
            events,
        }
    }

    /// Broker address as `host:port`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// # Contract between the runtime and a bus implementation.
///
/// `connect` registers every subscription in the config and starts message
/// delivery; it resolves only once the connection is established (or fails
/// for good after the configured retries). `publish` is fire-and-forget
/// from the runtime's point of view.
#[async_trait]
pub trait BusClient: Send + Sync + 'static {
    /// Establishes the connection and registers all subscriptions.
    ///
    /// Retry semantics follow the config's reconnect knobs; a failure
    /// returned here means retries are exhausted and startup must abort.
    async fn connect(&self, config: BusConfig) -> Result<(), RuntimeError>;

    /// Publishes a JSON payload to `topic`.
    async fn publish(&self, topic: &str, payload: Value) -> Result<(), DeliveryError>;
}
