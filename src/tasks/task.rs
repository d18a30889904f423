//! # Task abstractions for the two concurrency strategies.
//!
//! [`Task`] is the suspending form: async, cancelable, multiplexed with
//! every other unit on one scheduler. [`BlockingTask`] is the threaded
//! form: a plain blocking call that owns its OS thread for the process
//! lifetime.
//!
//! Which form a task must take is decided by the process-wide strategy;
//! the orchestrator validates the match once, before scheduling anything.

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Shared handle to a suspending task.
pub type TaskRef = Arc<dyn Task>;

/// Shared handle to a blocking task.
pub type BlockingTaskRef = Arc<dyn BlockingTask>;

/// # A suspending, cancelable background unit.
///
/// Runs on the cooperative scheduler alongside every other unit. A task
/// receives a [`CancellationToken`] and should check it at its suspension
/// points to exit promptly during shutdown.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use colony::{Task, TaskError};
///
/// struct Ticker;
///
/// #[async_trait]
/// impl Task for Ticker {
///     fn name(&self) -> &str { "ticker" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
///         while !ctx.is_cancelled() {
///             tokio::time::sleep(std::time::Duration::from_millis(250)).await;
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Executes the task until completion or cancellation.
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError>;
}

/// # A blocking background unit.
///
/// Runs on its own OS thread under the threaded strategy. There is no
/// cancellation primitive for blocking units; they are expected to run
/// until the process terminates.
pub trait BlockingTask: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Executes the task. May block indefinitely.
    fn run(&self) -> Result<(), TaskError>;
}
