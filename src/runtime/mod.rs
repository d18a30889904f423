//! Runtime core: the orchestrator and its builder.
//!
//! Internal modules:
//! - [`builder`]: collects registrations and assembles the [`App`];
//! - [`core`]: the startup state machine and both scheduling strategies;
//! - [`shutdown`]: cross-platform termination signal handling.

mod builder;
mod core;
mod shutdown;

pub use builder::AppBuilder;
pub use core::{App, AppHandle};
