//! # In-process bus for tests and standalone runs.
//!
//! [`MemoryBus`] implements the [`BusClient`] contract without a broker:
//! `connect` captures the finalized subscription map, `publish` dispatches
//! straight to the registered handler, and [`MemoryBus::request`] gives
//! tests the request/reply round-trip a real bus client would provide.
//!
//! Because only the topics present in the connect-time subscription map
//! are registered, a request on any other topic fails with
//! [`DeliveryError::NoResponders`] — exactly the behavior filtered-out
//! topics must exhibit.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{BusClient, BusConfig};
use crate::error::{DeliveryError, RuntimeError};
use crate::events::{Event, EventHub, EventKind};
use crate::topics::Subscriptions;

/// In-memory [`BusClient`] implementation.
///
/// Cheap to clone; all clones share one subscription table.
#[derive(Clone, Default)]
pub struct MemoryBus {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    state: RwLock<Option<State>>,
}

struct State {
    subscriptions: Subscriptions,
    events: EventHub,
}

impl MemoryBus {
    /// Creates a disconnected in-memory bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once `connect` has run.
    pub async fn is_connected(&self) -> bool {
        self.inner.state.read().await.is_some()
    }

    /// Topics with a registered handler, sorted.
    pub async fn subscribed_topics(&self) -> Vec<String> {
        match self.inner.state.read().await.as_ref() {
            Some(state) => state.subscriptions.keys().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Request/reply round-trip: delivers `payload` to the handler
    /// registered for `topic` and returns its reply.
    ///
    /// Fails with [`DeliveryError::NoResponders`] when no subscription
    /// exists (never connected, or the topic was filtered out). A handler
    /// that replies with nothing yields `Value::Null`.
    pub async fn request(&self, topic: &str, payload: Value) -> Result<Value, DeliveryError> {
        let handler = {
            let state = self.inner.state.read().await;
            state
                .as_ref()
                .and_then(|s| s.subscriptions.get(topic).cloned())
                .ok_or_else(|| DeliveryError::NoResponders {
                    topic: topic.to_string(),
                })?
        };
        let reply = handler.handle(topic, payload).await?;
        Ok(reply.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl BusClient for MemoryBus {
    async fn connect(&self, config: BusConfig) -> Result<(), RuntimeError> {
        let mut state = self.inner.state.write().await;
        *state = Some(State {
            subscriptions: config.subscriptions,
            events: config.events,
        });
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Value) -> Result<(), DeliveryError> {
        // Fire-and-forget: missing subscribers are not an error on publish.
        let delivery = {
            let state = self.inner.state.read().await;
            state.as_ref().and_then(|s| {
                s.subscriptions
                    .get(topic)
                    .cloned()
                    .map(|handler| (handler, s.events.clone()))
            })
        };
        if let Some((handler, events)) = delivery {
            let topic = topic.to_string();
            tokio::spawn(async move {
                if let Err(e) = handler.handle(&topic, payload).await {
                    events.publish(
                        Event::now(EventKind::HandlerFailed)
                            .with_topic(topic)
                            .with_reason(e.to_string()),
                    );
                }
            });
        }
        Ok(())
    }
}
