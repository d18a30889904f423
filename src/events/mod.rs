//! Lifecycle event stream for the runtime.
//!
//! The orchestrator and its units publish [`Event`]s to an in-process
//! [`EventHub`] (a broadcast channel); [`LogWriter`] is the built-in
//! subscriber that renders them through `tracing`.
//!
//! Modules:
//! - [`event`]: [`Event`] / [`EventKind`] definitions;
//! - [`hub`]: broadcast wrapper with non-blocking publish;
//! - [`log`]: `tracing`-backed subscriber and logging setup.

mod event;
mod hub;
mod log;

pub use event::{Event, EventKind};
pub use hub::EventHub;
pub use log::{init_logging, LogWriter};
