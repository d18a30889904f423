//! # Closure-backed task implementations.
//!
//! [`TaskFn`] wraps `F: Fn(CancellationToken) -> Fut`, producing a fresh
//! future per run; [`BlockingFn`] wraps a plain blocking closure. Neither
//! keeps hidden mutable state between runs — shared state goes through an
//! explicit `Arc` inside the closure.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use colony::{TaskFn, TaskRef, TaskError};
//!
//! let t: TaskRef = TaskFn::arc("worker", |ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Ok(());
//!     }
//!     Ok::<_, TaskError>(())
//! });
//! assert_eq!(t.name(), "worker");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::task::{BlockingTask, BlockingTaskRef, Task, TaskRef};

/// Suspending task backed by a closure.
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F, Fut> TaskFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    /// Creates a new function-backed task.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the task and returns it as a shared [`TaskRef`].
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> TaskRef {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Task for TaskFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        (self.f)(ctx).await
    }
}

/// Blocking task backed by a closure.
pub struct BlockingFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> BlockingFn<F>
where
    F: Fn() -> Result<(), TaskError> + Send + Sync + 'static,
{
    /// Creates a new function-backed blocking task.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the task and returns it as a shared [`BlockingTaskRef`].
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> BlockingTaskRef {
        Arc::new(Self::new(name, f))
    }
}

impl<F> BlockingTask for BlockingFn<F>
where
    F: Fn() -> Result<(), TaskError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self) -> Result<(), TaskError> {
        (self.f)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_task_fn_runs_closure() {
        let t = TaskFn::arc("once", |_ctx| async { Ok(()) });
        assert_eq!(t.name(), "once");
        assert!(t.run(CancellationToken::new()).await.is_ok());
    }

    #[test]
    fn test_blocking_fn_runs_closure() {
        let t = BlockingFn::arc("sync", || {
            Err(TaskError::Fail {
                error: "boom".into(),
            })
        });
        assert_eq!(t.name(), "sync");
        assert!(t.run().is_err());
    }
}
