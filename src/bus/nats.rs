//! # NATS-backed bus client.
//!
//! Maps the [`BusClient`] contract onto `async-nats`:
//!
//! - reconnect knobs go into [`async_nats::ConnectOptions`] (the retry
//!   state machine lives in the NATS client, not here);
//! - each subscription becomes a core NATS subscription, queue-grouped
//!   when a queue group is configured;
//! - under the threaded strategy, `num_queues` parallel queue consumers
//!   are created per topic so deliveries load-balance across them;
//! - payloads are JSON; a handler reply is published back to the
//!   delivery's reply subject when one is present.
//!
//! Handler failures are reported on the lifecycle hub and logged; they
//! never stop the delivery loop.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::warn;

use super::{BusClient, BusConfig};
use crate::config::Strategy;
use crate::error::{DeliveryError, RuntimeError};
use crate::events::{Event, EventHub, EventKind};
use crate::topics::HandlerRef;

/// NATS implementation of the bus contract.
///
/// Cheap to clone; all clones share one connection.
#[derive(Clone, Default)]
pub struct NatsBus {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    client: RwLock<Option<async_nats::Client>>,
}

impl NatsBus {
    /// Creates a disconnected NATS bus.
    pub fn new() -> Self {
        Self::default()
    }

    fn connect_options(config: &BusConfig) -> async_nats::ConnectOptions {
        let wait = config.reconnect_wait;
        let opts = async_nats::ConnectOptions::new()
            .name(config.client_id.clone())
            .reconnect_delay_callback(move |_attempt| wait);
        if config.allow_reconnect {
            opts.max_reconnects(Some(config.max_reconnect_attempts))
        } else {
            opts.max_reconnects(Some(0))
        }
    }

    /// Spawns the delivery loop(s) for one topic.
    ///
    /// Plain subscription when no queue group is configured; otherwise a
    /// queue subscription, fanned out over `consumers` parallel loops.
    async fn subscribe_topic(
        client: &async_nats::Client,
        topic: &str,
        handler: HandlerRef,
        events: &EventHub,
        queue_group: &str,
        consumers: usize,
    ) -> Result<(), RuntimeError> {
        // Without a queue group, parallel consumers would each receive
        // every message; keep a single loop in that case.
        let consumers = if queue_group.is_empty() { 1 } else { consumers };

        for _ in 0..consumers {
            let subscriber = if queue_group.is_empty() {
                client.subscribe(topic.to_string()).await
            } else {
                client
                    .queue_subscribe(topic.to_string(), queue_group.to_string())
                    .await
            }
            .map_err(|e| RuntimeError::Connect {
                reason: format!("subscribe `{topic}` failed: {e}"),
            })?;

            let client = client.clone();
            let handler = handler.clone();
            let events = events.clone();
            let topic = topic.to_string();
            tokio::spawn(async move {
                let mut subscriber = subscriber;
                while let Some(msg) = subscriber.next().await {
                    dispatch(&client, &topic, &handler, &events, msg).await;
                }
            });
        }
        Ok(())
    }
}

/// Delivers one message to its handler and publishes the reply, if any.
async fn dispatch(
    client: &async_nats::Client,
    topic: &str,
    handler: &HandlerRef,
    events: &EventHub,
    msg: async_nats::Message,
) {
    let payload = if msg.payload.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&msg.payload) {
            Ok(v) => v,
            Err(e) => {
                warn!(topic, error = %e, "dropping message with malformed payload");
                return;
            }
        }
    };

    match handler.handle(topic, payload).await {
        Ok(Some(reply)) => {
            if let Some(reply_subject) = msg.reply {
                let bytes = match serde_json::to_vec(&reply) {
                    Ok(b) => Bytes::from(b),
                    Err(e) => {
                        warn!(topic, error = %e, "reply serialization failed");
                        return;
                    }
                };
                if let Err(e) = client.publish(reply_subject, bytes).await {
                    warn!(topic, error = %e, "reply publish failed");
                }
            }
        }
        Ok(None) => {}
        Err(e) => {
            events.publish(
                Event::now(EventKind::HandlerFailed)
                    .with_topic(topic)
                    .with_reason(e.to_string()),
            );
            warn!(topic, error = %e, label = e.as_label(), "handler failed");
        }
    }
}

#[async_trait]
impl BusClient for NatsBus {
    async fn connect(&self, config: BusConfig) -> Result<(), RuntimeError> {
        let opts = Self::connect_options(&config);
        let addr = format!("nats://{}", config.addr());
        let client = opts
            .connect(addr.as_str())
            .await
            .map_err(|e| RuntimeError::Connect {
                reason: format!("connect to {addr} failed: {e}"),
            })?;

        let consumers = match config.strategy {
            Strategy::Threaded => config.num_queues.max(1),
            Strategy::Cooperative => 1,
        };

        for (topic, handler) in &config.subscriptions {
            Self::subscribe_topic(
                &client,
                topic,
                handler.clone(),
                &config.events,
                &config.queue_group,
                consumers,
            )
            .await?;
        }

        let mut slot = self.inner.client.write().await;
        *slot = Some(client);
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Value) -> Result<(), DeliveryError> {
        let client = {
            let slot = self.inner.client.read().await;
            slot.clone()
                .ok_or_else(|| DeliveryError::Transport("bus not connected".to_string()))?
        };
        let bytes = serde_json::to_vec(&payload)
            .map_err(|e| DeliveryError::Payload(e.to_string()))
            .map(Bytes::from)?;
        client
            .publish(topic.to_string(), bytes)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))
    }
}
