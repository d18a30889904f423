//! # Builder for assembling an [`App`].
//!
//! The builder is where the two registration sources meet:
//!
//! - **static** declarations, added one at a time ([`AppBuilder::listen`],
//!   [`AppBuilder::task`], [`AppBuilder::interval_task`]);
//! - **dynamic** collections supplied wholesale at construction
//!   ([`AppBuilder::with_subscriptions`], [`AppBuilder::with_tasks`]).
//!
//! Merging and validation happen later, inside [`App::run`]; the builder
//! only collects. Note the deliberate asymmetry: there is no dynamic
//! counterpart for interval tasks.
//!
//! Collaborators (bus client, HTTP listener) are injected here behind
//! their contracts; no ambient globals hold the running instance.

use std::sync::Arc;

use crate::bus::BusClient;
use crate::config::AppConfig;
use crate::events::EventHub;
use crate::identity::ServiceIdentity;
use crate::tasks::{IntervalTasks, TaskUnit};
use crate::topics::{HandlerRef, Subscriptions};

#[cfg(feature = "http")]
use crate::http::HttpListener;

use super::core::{App, HttpSlot};

/// Collects handler, task, and collaborator registrations for an [`App`].
pub struct AppBuilder {
    cfg: AppConfig,
    static_bindings: Subscriptions,
    dynamic_bindings: Subscriptions,
    static_tasks: Vec<TaskUnit>,
    dynamic_tasks: Vec<TaskUnit>,
    interval_tasks: IntervalTasks,
    bus: Option<Arc<dyn BusClient>>,
    http: HttpSlot,
}

impl AppBuilder {
    /// Creates a builder for the given configuration.
    pub fn new(cfg: AppConfig) -> Self {
        Self {
            cfg,
            static_bindings: Subscriptions::new(),
            dynamic_bindings: Subscriptions::new(),
            static_tasks: Vec::new(),
            dynamic_tasks: Vec::new(),
            interval_tasks: IntervalTasks::new(),
            bus: None,
            http: HttpSlot::default(),
        }
    }

    /// Statically binds `handler` to `topic`.
    ///
    /// Registering the same topic again replaces the previous handler
    /// (last registration wins).
    pub fn listen(mut self, topic: impl Into<String>, handler: HandlerRef) -> Self {
        self.static_bindings.insert(topic.into(), handler);
        self
    }

    /// Supplies dynamic bindings.
    ///
    /// On a topic collision with a static binding, the dynamic entry wins.
    pub fn with_subscriptions(mut self, bindings: Subscriptions) -> Self {
        self.dynamic_bindings.extend(bindings);
        self
    }

    /// Statically declares a one-shot task.
    pub fn task(mut self, unit: TaskUnit) -> Self {
        self.static_tasks.push(unit);
        self
    }

    /// Supplies dynamic one-shot tasks, scheduled after all static ones.
    pub fn with_tasks(mut self, units: Vec<TaskUnit>) -> Self {
        self.dynamic_tasks.extend(units);
        self
    }

    /// Statically declares a recurring task under `interval_secs`.
    ///
    /// Interval tasks have no dynamic registration path.
    pub fn interval_task(mut self, interval_secs: u64, unit: TaskUnit) -> Self {
        self.interval_tasks
            .entry(interval_secs)
            .or_default()
            .push(unit);
        self
    }

    /// Injects the bus client collaborator.
    ///
    /// Defaults to [`NatsBus`](crate::bus::NatsBus) when the `nats` feature
    /// is enabled, otherwise to the in-process [`MemoryBus`](crate::bus::MemoryBus).
    pub fn with_bus(mut self, bus: Arc<dyn BusClient>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Attaches the optional HTTP listener.
    #[cfg(feature = "http")]
    pub fn with_http(mut self, listener: HttpListener) -> Self {
        self.http = Some(listener);
        self
    }

    /// Resolves the service identity and assembles the [`App`].
    ///
    /// The resolved client id is exported into the environment so
    /// collaborators can read it. Merging, filtering, and strategy
    /// validation are deferred to [`App::run`].
    pub fn build(self) -> App {
        let identity =
            ServiceIdentity::resolve(&self.cfg.service_name, self.cfg.client_id.as_deref());
        identity.export();

        let bus: Arc<dyn BusClient> = match self.bus {
            Some(bus) => bus,
            #[cfg(feature = "nats")]
            None => Arc::new(crate::bus::NatsBus::new()),
            #[cfg(not(feature = "nats"))]
            None => Arc::new(crate::bus::MemoryBus::new()),
        };

        App::assemble(
            self.cfg,
            identity,
            EventHub::default(),
            self.static_bindings,
            self.dynamic_bindings,
            self.static_tasks,
            self.dynamic_tasks,
            self.interval_tasks,
            bus,
            self.http,
        )
    }
}
