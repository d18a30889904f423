//! # colony
//!
//! **Colony** is a microservice runtime skeleton for Rust.
//!
//! It wires a message-bus client, application-defined message handlers,
//! background tasks, and an optional HTTP listener into one running
//! process, and governs how that process starts up and executes
//! concurrently.
//!
//! ## Architecture
//! ```text
//!  AppConfig ──► AppBuilder ── listen()/task()/interval_task()   (static)
//!                    │          with_subscriptions()/with_tasks() (dynamic)
//!                    ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  App (runtime orchestrator)                                      │
//! │  - ServiceIdentity (client id, resolved once)                    │
//! │  - build_subscriptions (merge + inclusion filter)                │
//! │  - build_tasks (merge + strategy validation)                     │
//! │  - EventHub (lifecycle events) ──► LogWriter ──► tracing        │
//! └───────┬──────────────────────┬──────────────────────┬────────────┘
//!         ▼                      ▼                      ▼
//!   BusClient               TaskSet units          HttpListener
//!   (connect/publish/       (Cooperative: one      (axum, optional)
//!    deliver to handlers)    scheduler; Threaded:
//!                            one OS thread each)
//! ```
//!
//! ## Startup sequence
//! ```text
//! CONFIGURED → CONNECTING → SCHEDULING → RUNNING → (STOPPED | FAILED)
//!
//! 1. resolve identity, merge+filter subscriptions, finalize BusConfig
//! 2. bus connect (retries inside the bus client; exhausted = FAILED)
//! 3. merge tasks, validate modes against the strategy (mismatch = FAILED,
//!    before anything is scheduled)
//! 4. Cooperative: spawn every unit + HTTP on one scheduler, serve until
//!                 terminated (finished units do not end the process)
//!    Threaded:    bind HTTP, settle pause, one thread per unit, return
//! 5. termination signal cancels everything (no internal stop trigger)
//! ```
//!
//! ## Features
//! | Area           | Description                                          | Key types                             |
//! |----------------|------------------------------------------------------|---------------------------------------|
//! | **Handlers**   | Bind bus topics to `(topic, message) → result` fns.  | [`Handler`], [`HandlerFn`]            |
//! | **Tasks**      | One-shot and interval background units, mode-tagged. | [`Task`], [`BlockingTask`], [`TaskUnit`] |
//! | **Strategies** | Cooperative scheduler vs. per-unit OS threads.       | [`Strategy`]                          |
//! | **Bus**        | Narrow connect/publish/deliver contract.             | [`BusClient`], [`BusConfig`]          |
//! | **Events**     | Lifecycle event stream with a `tracing` sink.        | [`Event`], [`EventHub`], [`LogWriter`]|
//! | **Errors**     | Startup-fatal vs. unit-local taxonomy.               | [`RuntimeError`], [`DeliveryError`]   |
//!
//! ## Optional features
//! - `nats` *(default)*: NATS-backed [`NatsBus`] bus client.
//! - `http` *(default)*: axum-backed [`HttpListener`].
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use colony::{App, AppConfig, HandlerFn, TaskFn, TaskUnit};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     colony::init_logging("greeter");
//!
//!     let mut cfg = AppConfig::new("127.0.0.1", 4222, "greeter");
//!     cfg.include_filter = Some(vec!["greet".to_string()]);
//!
//!     let app = App::builder(cfg)
//!         .listen(
//!             "greet.hello",
//!             HandlerFn::arc(|_topic, _msg| async move {
//!                 Ok(Some(serde_json::json!({ "data": "hello" })))
//!             }),
//!         )
//!         .task(TaskUnit::Suspending(TaskFn::arc("ticker", |ctx| async move {
//!             while !ctx.is_cancelled() {
//!                 tokio::time::sleep(std::time::Duration::from_secs(1)).await;
//!             }
//!             Ok(())
//!         })))
//!         .build();
//!
//!     let handle = app.handle();
//!     let _ = Arc::new(handle); // share with anything that publishes
//!
//!     app.run().await?; // cooperative: blocks until terminated
//!     Ok(())
//! }
//! ```

mod bus;
mod config;
mod error;
mod events;
#[cfg(feature = "http")]
mod http;
mod identity;
mod runtime;
mod tasks;
mod topics;

// ---- Public re-exports ----

pub use bus::{BusClient, BusConfig, MemoryBus};
pub use config::{AppConfig, Strategy};
pub use error::{DeliveryError, RuntimeError, TaskError};
pub use events::{init_logging, Event, EventHub, EventKind, LogWriter};
pub use identity::{ServiceIdentity, CLIENT_ID_ENV, HOST_ENV};
pub use runtime::{App, AppBuilder, AppHandle};
pub use tasks::{
    BlockingFn, BlockingTask, BlockingTaskRef, IntervalTasks, Task, TaskFn, TaskMode, TaskRef,
    TaskSet, TaskUnit,
};
pub use topics::{
    build_subscriptions, Handler, HandlerFn, HandlerRef, HandlerResult, Subscriptions,
};

#[cfg(feature = "nats")]
pub use bus::NatsBus;

#[cfg(feature = "http")]
pub use http::HttpListener;
