//! # Tagged task units and the merged task set.
//!
//! Every registered task carries its execution mode in the type: a
//! [`TaskUnit`] is either `Suspending` (a [`Task`]) or `Blocking` (a
//! [`BlockingTask`]). The mode is attached at registration time and
//! validated once against the process strategy during scheduling — there
//! is no runtime introspection of callables.
//!
//! [`build_tasks`] merges the statically declared tasks with the
//! caller-supplied ones:
//!
//! - one-shot tasks: static first, then dynamic, order preserved;
//! - interval tasks: the static mapping is used as-is. There is **no**
//!   dynamic merge path for interval tasks; the asymmetry with one-shot
//!   tasks is deliberate.

use std::collections::BTreeMap;
use std::fmt;

use crate::config::Strategy;
use crate::error::RuntimeError;
use crate::tasks::task::{BlockingTaskRef, TaskRef};

/// Execution mode of a task unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskMode {
    /// Suspends at I/O; runs on the cooperative scheduler.
    Suspending,
    /// Blocks; runs on its own OS thread.
    Blocking,
}

impl fmt::Display for TaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskMode::Suspending => f.write_str("suspending"),
            TaskMode::Blocking => f.write_str("blocking"),
        }
    }
}

/// A background task tagged with its execution mode.
#[derive(Clone)]
pub enum TaskUnit {
    /// Suspending unit for the cooperative strategy.
    Suspending(TaskRef),
    /// Blocking unit for the threaded strategy.
    Blocking(BlockingTaskRef),
}

impl TaskUnit {
    /// Task name.
    pub fn name(&self) -> &str {
        match self {
            TaskUnit::Suspending(t) => t.name(),
            TaskUnit::Blocking(t) => t.name(),
        }
    }

    /// Execution mode carried by this unit.
    pub fn mode(&self) -> TaskMode {
        match self {
            TaskUnit::Suspending(_) => TaskMode::Suspending,
            TaskUnit::Blocking(_) => TaskMode::Blocking,
        }
    }
}

impl fmt::Debug for TaskUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskUnit")
            .field("name", &self.name())
            .field("mode", &self.mode())
            .finish()
    }
}

/// Interval-keyed groups of recurring tasks, ordered by interval seconds.
pub type IntervalTasks = BTreeMap<u64, Vec<TaskUnit>>;

/// The finalized, validated set of background work.
///
/// Built once during scheduling and never mutated after dispatch begins.
/// First-execution order under the cooperative strategy: `one_shot` in
/// declared order, then `interval` groups in interval-key order, each
/// group in list order.
#[derive(Debug)]
pub struct TaskSet {
    /// One-shot tasks, static declarations first.
    pub one_shot: Vec<TaskUnit>,
    /// Recurring tasks grouped by interval seconds.
    pub interval: IntervalTasks,
}

impl TaskSet {
    /// Total number of units in the set.
    pub fn len(&self) -> usize {
        self.one_shot.len() + self.interval.values().map(Vec::len).sum::<usize>()
    }

    /// Returns true if the set holds no units.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Merges static and dynamic tasks and validates them against `strategy`.
///
/// One-shot order is static-then-dynamic; the interval mapping is taken
/// as-is (no dynamic interval tasks). Validation requires every unit's
/// mode to match the strategy — [`Strategy::Cooperative`] accepts only
/// [`TaskMode::Suspending`] units, [`Strategy::Threaded`] only
/// [`TaskMode::Blocking`] ones. The first mismatch aborts with
/// [`RuntimeError::ConcurrencyContract`] naming the task, before anything
/// is scheduled.
pub fn build_tasks(
    static_tasks: Vec<TaskUnit>,
    dynamic_tasks: Vec<TaskUnit>,
    interval_tasks: IntervalTasks,
    strategy: Strategy,
) -> Result<TaskSet, RuntimeError> {
    let mut one_shot = static_tasks;
    one_shot.extend(dynamic_tasks);

    let expected = match strategy {
        Strategy::Cooperative => TaskMode::Suspending,
        Strategy::Threaded => TaskMode::Blocking,
    };

    let all = one_shot.iter().chain(interval_tasks.values().flatten());
    for unit in all {
        if unit.mode() != expected {
            return Err(RuntimeError::ConcurrencyContract {
                task: unit.name().to_string(),
                expected,
            });
        }
    }

    Ok(TaskSet {
        one_shot,
        interval: interval_tasks,
    })
}
