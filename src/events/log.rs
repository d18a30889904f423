//! # Logging sink for lifecycle events.
//!
//! [`LogWriter`] subscribes to the [`EventHub`] and renders every event as
//! a structured `tracing` record. [`init_logging`] installs a formatted
//! `tracing-subscriber` for processes that do not configure their own.
//!
//! The writer runs as its own suspending unit; dropping behind the hub's
//! ring buffer loses old records but never blocks a publisher.

use tracing::{error, info, warn};

use super::event::{Event, EventKind};
use super::hub::EventHub;

/// Forwards lifecycle events to `tracing`.
pub struct LogWriter;

impl LogWriter {
    /// Subscribes to `hub` and spawns the forwarding loop.
    ///
    /// Must be called from within a tokio runtime. The loop ends when the
    /// hub is dropped.
    pub fn spawn(hub: &EventHub) {
        let mut rx = hub.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => Self::write(&ev),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "lifecycle log fell behind");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Renders one event.
    fn write(ev: &Event) {
        match ev.kind {
            EventKind::Connecting => {
                info!(client_id = ev.detail.as_deref(), "connecting to bus");
            }
            EventKind::Connected => {
                info!(client_id = ev.detail.as_deref(), "bus connected");
            }
            EventKind::UnitLaunched => {
                info!(
                    unit = ev.unit.as_deref(),
                    interval = ev.detail.as_deref(),
                    "unit launched"
                );
            }
            EventKind::HttpStarted => {
                info!(addr = ev.detail.as_deref(), "http listener started");
            }
            EventKind::UnitStopped => {
                info!(unit = ev.unit.as_deref(), "unit stopped");
            }
            EventKind::UnitFailed => {
                error!(
                    unit = ev.unit.as_deref(),
                    reason = ev.reason.as_deref(),
                    "unit failed"
                );
            }
            EventKind::HandlerFailed => {
                warn!(
                    topic = ev.topic.as_deref(),
                    reason = ev.reason.as_deref(),
                    "handler failed"
                );
            }
            EventKind::ShutdownRequested => {
                info!("shutdown requested");
            }
            EventKind::AllStopped => {
                info!("all units stopped");
            }
        }
    }
}

/// Installs a formatted `tracing` subscriber honoring `RUST_LOG`.
///
/// Call once, early in `main`. Does nothing if a global subscriber is
/// already set.
pub fn init_logging(service_name: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
    info!(service = service_name, "logging initialized");
}
