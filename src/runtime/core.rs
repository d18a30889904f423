//! # The runtime orchestrator.
//!
//! [`App`] sequences startup so that subscriptions, tasks, interval tasks,
//! and the HTTP listener come up in a consistent order, without dropping
//! work or double-registering handlers.
//!
//! ## Startup state machine
//! ```text
//! CONFIGURED ──► CONNECTING ──► SCHEDULING ──► RUNNING ──► STOPPED
//!      │              │              │
//!      └──────────────┴──────────────┴──────► FAILED
//!
//! CONFIGURED → CONNECTING   identity resolved, bindings merged+filtered,
//!                           BusConfig finalized, bus connect awaited
//! CONNECTING → SCHEDULING   TaskSet merged and validated against the
//!                           strategy (first mismatch aborts; nothing has
//!                           been scheduled yet)
//! SCHEDULING → RUNNING      cooperative: every unit spawned on one
//!                           scheduler, process serves until terminated
//!                           threaded: HTTP bound, settle pause, one thread
//!                           per unit, control returns to the caller
//! RUNNING → STOPPED         termination signal only; all units cancelled
//! ```
//!
//! ## Failure rules
//! - Configuration and scheduling errors abort startup entirely; partial
//!   startup (some units running, others not) is never observable —
//!   validation and the HTTP bind both happen before the first unit is
//!   handed to a scheduler.
//! - Bus connectivity failures are retried inside the bus client per its
//!   config, then become fatal here.
//! - Once running, a failing unit is reported on the event hub and left
//!   alone; siblings are never stopped on its behalf and nothing is
//!   restarted.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::bus::{BusClient, BusConfig};
use crate::config::{AppConfig, Strategy};
use crate::error::{DeliveryError, RuntimeError, TaskError};
use crate::events::{Event, EventHub, EventKind, LogWriter};
use crate::identity::ServiceIdentity;
use crate::tasks::{build_tasks, IntervalTasks, TaskSet, TaskUnit};
use crate::topics::{build_subscriptions, Subscriptions};

use super::builder::AppBuilder;
use super::shutdown;

/// Slot for the optional HTTP listener; collapses to a unit type when the
/// `http` feature is off so the orchestrator keeps a single code path.
#[cfg(feature = "http")]
pub(super) type HttpSlot = Option<crate::http::HttpListener>;
#[cfg(not(feature = "http"))]
pub(super) type HttpSlot = ();

/// Pause before launching threaded units, letting the bus connection settle.
const THREADED_SETTLE: Duration = Duration::from_secs(1);

/// The assembled runtime, ready to run.
///
/// Construct through [`App::builder`]. Call [`App::handle`] before
/// [`App::run`] if other code needs to publish to the bus or observe
/// lifecycle events.
pub struct App {
    cfg: AppConfig,
    identity: ServiceIdentity,
    hub: EventHub,
    static_bindings: Subscriptions,
    dynamic_bindings: Subscriptions,
    static_tasks: Vec<TaskUnit>,
    dynamic_tasks: Vec<TaskUnit>,
    interval_tasks: IntervalTasks,
    bus: Arc<dyn BusClient>,
    http: HttpSlot,
}

/// Cloneable handle to a constructed [`App`].
///
/// This is the explicit replacement for a process-wide "current app"
/// global: thread it through whatever code needs bus access.
#[derive(Clone)]
pub struct AppHandle {
    identity: ServiceIdentity,
    hub: EventHub,
    bus: Arc<dyn BusClient>,
}

impl AppHandle {
    /// The resolved service identity.
    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    /// The lifecycle event hub (subscribe for observability).
    pub fn events(&self) -> EventHub {
        self.hub.clone()
    }

    /// Publishes a payload to `topic` on the bus.
    pub async fn publish<T: Serialize>(&self, topic: &str, payload: T) -> Result<(), DeliveryError> {
        let value = serde_json::to_value(payload)
            .map_err(|e| DeliveryError::Payload(e.to_string()))?;
        self.bus.publish(topic, value).await
    }
}

impl App {
    /// Starts building an app for the given configuration.
    pub fn builder(cfg: AppConfig) -> AppBuilder {
        AppBuilder::new(cfg)
    }

    #[allow(clippy::too_many_arguments)]
    pub(super) fn assemble(
        cfg: AppConfig,
        identity: ServiceIdentity,
        hub: EventHub,
        static_bindings: Subscriptions,
        dynamic_bindings: Subscriptions,
        static_tasks: Vec<TaskUnit>,
        dynamic_tasks: Vec<TaskUnit>,
        interval_tasks: IntervalTasks,
        bus: Arc<dyn BusClient>,
        http: HttpSlot,
    ) -> Self {
        Self {
            cfg,
            identity,
            hub,
            static_bindings,
            dynamic_bindings,
            static_tasks,
            dynamic_tasks,
            interval_tasks,
            bus,
            http,
        }
    }

    /// Returns a handle for publishing and event observation.
    pub fn handle(&self) -> AppHandle {
        AppHandle {
            identity: self.identity.clone(),
            hub: self.hub.clone(),
            bus: self.bus.clone(),
        }
    }

    /// Runs the startup sequence and dispatches under the configured
    /// strategy.
    ///
    /// Under [`Strategy::Cooperative`] this blocks until a termination
    /// signal arrives. Finished units do not end the process: bus delivery
    /// (and the HTTP listener, if any) keeps serving even after every unit
    /// of our own has completed. Under [`Strategy::Threaded`] it returns
    /// once all threads are launched and the HTTP listener (if any) has
    /// started; the caller keeps the process (and the tokio runtime driving
    /// bus delivery) alive.
    ///
    /// Any error here means startup was aborted with no unit scheduled.
    pub async fn run(self) -> Result<(), RuntimeError> {
        LogWriter::spawn(&self.hub);

        // CONFIGURED → CONNECTING
        let subscriptions = build_subscriptions(
            self.static_bindings,
            self.dynamic_bindings,
            self.cfg.include_filter.as_deref(),
        );
        let bus_config =
            BusConfig::assemble(&self.cfg, &self.identity, subscriptions, self.hub.clone());

        self.hub
            .publish(Event::now(EventKind::Connecting).with_detail(self.identity.client_id()));
        self.bus.connect(bus_config).await?;
        self.hub
            .publish(Event::now(EventKind::Connected).with_detail(self.identity.client_id()));

        // CONNECTING → SCHEDULING
        let set = build_tasks(
            self.static_tasks,
            self.dynamic_tasks,
            self.interval_tasks,
            self.cfg.strategy,
        )?;

        // SCHEDULING → RUNNING
        match self.cfg.strategy {
            Strategy::Cooperative => Self::run_cooperative(self.hub, set, self.http).await,
            Strategy::Threaded => Self::run_threaded(self.hub, set, self.http).await,
        }
    }

    /// Cooperative strategy: every unit is a suspending task on one
    /// scheduler; the process serves until a termination signal arrives.
    async fn run_cooperative(
        hub: EventHub,
        set: TaskSet,
        http: HttpSlot,
    ) -> Result<(), RuntimeError> {
        // Bind the listener before anything is scheduled so a bad address
        // fails startup with nothing running.
        #[cfg(feature = "http")]
        let bound = bind_listener(http).await?;
        #[cfg(not(feature = "http"))]
        let _ = http;

        let token = CancellationToken::new();
        let mut units: JoinSet<()> = JoinSet::new();

        // First-execution order: one-shots in declared order, then interval
        // groups in interval-key order. Modes were validated in SCHEDULING.
        for unit in set.one_shot {
            if let TaskUnit::Suspending(task) = unit {
                hub.publish(Event::now(EventKind::UnitLaunched).with_unit(task.name()));
                let hub = hub.clone();
                let ctx = token.child_token();
                units.spawn(async move {
                    let name = task.name().to_string();
                    match task.run(ctx).await {
                        Ok(()) | Err(TaskError::Canceled) => {
                            hub.publish(Event::now(EventKind::UnitStopped).with_unit(name));
                        }
                        Err(e) => {
                            hub.publish(
                                Event::now(EventKind::UnitFailed)
                                    .with_unit(name)
                                    .with_reason(e.to_string()),
                            );
                        }
                    }
                });
            }
        }

        for (secs, group) in set.interval {
            for unit in group {
                if let TaskUnit::Suspending(task) = unit {
                    hub.publish(
                        Event::now(EventKind::UnitLaunched)
                            .with_unit(task.name())
                            .with_detail(format!("{secs}s")),
                    );
                    let hub = hub.clone();
                    let ctx = token.child_token();
                    units.spawn(run_interval_unit(task, secs, ctx, hub));
                }
            }
        }

        #[cfg(feature = "http")]
        if let Some((addr, bound)) = bound {
            let hub_http = hub.clone();
            units.spawn(async move {
                if let Err(e) = bound.serve().await {
                    hub_http.publish(
                        Event::now(EventKind::UnitFailed)
                            .with_unit("http_listener")
                            .with_reason(e.to_string()),
                    );
                }
            });
            hub.publish(Event::now(EventKind::HttpStarted).with_detail(addr));
        }

        // Bus subscriptions (and the listener) keep the process serving
        // even after every unit of our own has finished, so a drained join
        // set does not end the running state. Only a termination signal
        // does.
        let _ = shutdown::wait_for_termination().await;
        hub.publish(Event::now(EventKind::ShutdownRequested));
        token.cancel();
        while units.join_next().await.is_some() {}
        hub.publish(Event::now(EventKind::AllStopped));
        Ok(())
    }

    /// Threaded strategy: one OS thread per unit, then control returns to
    /// the caller.
    async fn run_threaded(hub: EventHub, set: TaskSet, http: HttpSlot) -> Result<(), RuntimeError> {
        // Bind the listener before any thread launches so a bad address
        // fails startup with nothing running.
        #[cfg(feature = "http")]
        let bound = bind_listener(http).await?;
        #[cfg(not(feature = "http"))]
        let _ = http;

        tokio::time::sleep(THREADED_SETTLE).await;

        for unit in set.one_shot {
            if let TaskUnit::Blocking(task) = unit {
                spawn_blocking_thread(&hub, task, None)?;
            }
        }

        for (secs, group) in set.interval {
            for unit in group {
                if let TaskUnit::Blocking(task) = unit {
                    spawn_blocking_thread(&hub, task, Some(secs))?;
                }
            }
        }

        #[cfg(feature = "http")]
        if let Some((addr, bound)) = bound {
            let hub_http = hub.clone();
            tokio::spawn(async move {
                if let Err(e) = bound.serve().await {
                    hub_http.publish(
                        Event::now(EventKind::UnitFailed)
                            .with_unit("http_listener")
                            .with_reason(e.to_string()),
                    );
                }
            });
            hub.publish(Event::now(EventKind::HttpStarted).with_detail(addr));
        }

        Ok(())
    }
}

/// Binds the configured listener, if any, mapping bind failures to a
/// scheduling error.
#[cfg(feature = "http")]
async fn bind_listener(
    http: HttpSlot,
) -> Result<Option<(String, crate::http::BoundListener)>, RuntimeError> {
    match http {
        Some(listener) => {
            let addr = listener.addr();
            let bound = listener
                .into_bound()
                .await
                .map_err(|e| RuntimeError::Scheduling {
                    unit: "http_listener".to_string(),
                    reason: e.to_string(),
                })?;
            Ok(Some((addr, bound)))
        }
        None => Ok(None),
    }
}

/// Runs one recurring unit: tick, run, report failures, keep going.
///
/// A failing run is local to this unit; the ticker continues. Cancellation
/// stops the loop at the next safe point.
async fn run_interval_unit(
    task: crate::tasks::TaskRef,
    secs: u64,
    ctx: CancellationToken,
    hub: EventHub,
) {
    let name = task.name().to_string();
    let mut ticker = tokio::time::interval(Duration::from_secs(secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ctx.cancelled() => {
                hub.publish(Event::now(EventKind::UnitStopped).with_unit(name));
                break;
            }
            _ = ticker.tick() => {
                match task.run(ctx.clone()).await {
                    Ok(()) => {}
                    Err(TaskError::Canceled) => {
                        hub.publish(Event::now(EventKind::UnitStopped).with_unit(name));
                        break;
                    }
                    Err(e) => {
                        hub.publish(
                            Event::now(EventKind::UnitFailed)
                                .with_unit(name.clone())
                                .with_reason(e.to_string()),
                        );
                    }
                }
            }
        }
    }
}

/// Launches one blocking unit on its own thread.
///
/// With `interval_secs`, the unit reruns after sleeping the interval;
/// blocking units have no cancellation primitive and run until the process
/// terminates.
fn spawn_blocking_thread(
    hub: &EventHub,
    task: crate::tasks::BlockingTaskRef,
    interval_secs: Option<u64>,
) -> Result<(), RuntimeError> {
    let name = task.name().to_string();
    let mut launched = Event::now(EventKind::UnitLaunched).with_unit(name.as_str());
    if let Some(secs) = interval_secs {
        launched = launched.with_detail(format!("{secs}s"));
    }

    let thread_hub = hub.clone();
    std::thread::Builder::new()
        .name(format!("colony-{name}"))
        .spawn(move || match interval_secs {
            None => match task.run() {
                Ok(()) | Err(TaskError::Canceled) => {
                    thread_hub.publish(Event::now(EventKind::UnitStopped).with_unit(task.name()));
                }
                Err(e) => {
                    thread_hub.publish(
                        Event::now(EventKind::UnitFailed)
                            .with_unit(task.name())
                            .with_reason(e.to_string()),
                    );
                }
            },
            Some(secs) => loop {
                if let Err(e) = task.run() {
                    thread_hub.publish(
                        Event::now(EventKind::UnitFailed)
                            .with_unit(task.name())
                            .with_reason(e.to_string()),
                    );
                }
                std::thread::sleep(Duration::from_secs(secs));
            },
        })
        .map_err(|e| RuntimeError::Scheduling {
            unit: name.clone(),
            reason: e.to_string(),
        })?;

    // Published only after the spawn succeeded, so a scheduling failure
    // leaves no phantom launch record.
    hub.publish(launched);
    Ok(())
}
