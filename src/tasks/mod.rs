//! Background tasks: traits, tagged units, and the merged task set.
//!
//! - [`task`]: the [`Task`] (suspending) and [`BlockingTask`] traits;
//! - [`task_fn`]: closure adapters [`TaskFn`] and [`BlockingFn`];
//! - [`set`]: [`TaskUnit`], [`TaskMode`], [`TaskSet`], and [`build_tasks`]
//!   (merge + strategy validation).

mod set;
mod task;
mod task_fn;

pub use set::{build_tasks, IntervalTasks, TaskMode, TaskSet, TaskUnit};
pub use task::{BlockingTask, BlockingTaskRef, Task, TaskRef};
pub use task_fn::{BlockingFn, TaskFn};
