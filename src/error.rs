//! Error types used by the colony runtime, bus delivery, and tasks.
//!
//! Three enums, matching the three failure scopes:
//!
//! - [`RuntimeError`] — startup-fatal errors raised by the orchestrator.
//! - [`DeliveryError`] — per-message failures, local to one delivery.
//! - [`TaskError`] — per-task failures, local to one background unit.
//!
//! Every [`RuntimeError`] aborts startup before any unit of work is
//! scheduled; once the runtime is running, only the local error kinds can
//! occur and they never escalate to a process-wide failure.

use thiserror::Error;

use crate::tasks::TaskMode;

/// # Errors produced by the colony orchestrator.
///
/// All variants are fatal at startup. None of them are raised after the
/// runtime reaches its running state.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A registered task's execution mode does not match the selected
    /// concurrency strategy (e.g. a blocking task under the cooperative
    /// strategy). Raised during scheduling, before any unit starts.
    #[error("task `{task}` violates the concurrency contract: expected a {expected} unit")]
    ConcurrencyContract {
        /// Name of the offending task.
        task: String,
        /// The mode the selected strategy requires.
        expected: TaskMode,
    },

    /// The bus client failed to establish a connection after exhausting its
    /// configured reconnect attempts.
    #[error("bus connection failed: {reason}")]
    Connect {
        /// Connection failure detail reported by the bus client.
        reason: String,
    },

    /// A unit of work (task, interval task, or HTTP listener) could not be
    /// registered with the chosen scheduler.
    #[error("failed to schedule `{unit}`: {reason}")]
    Scheduling {
        /// Name of the unit that could not be scheduled.
        unit: String,
        /// Underlying reason.
        reason: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::ConcurrencyContract { .. } => "concurrency_contract",
            RuntimeError::Connect { .. } => "bus_connect_failed",
            RuntimeError::Scheduling { .. } => "scheduling_failed",
        }
    }
}

/// # Errors produced while delivering or answering a single message.
///
/// These never abort the runtime: a failed delivery is reported to the
/// caller (for request/reply) or logged, and sibling handlers keep running.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// No subscription exists for the requested topic.
    #[error("no responders on topic `{topic}`")]
    NoResponders {
        /// The topic that had no registered handler.
        topic: String,
    },

    /// The bus transport rejected the operation.
    #[error("bus transport error: {0}")]
    Transport(String),

    /// The message payload could not be decoded or encoded.
    #[error("malformed payload: {0}")]
    Payload(String),

    /// The handler itself failed.
    #[error("handler failed: {0}")]
    Handler(String),
}

impl DeliveryError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            DeliveryError::NoResponders { .. } => "no_responders",
            DeliveryError::Transport(_) => "transport",
            DeliveryError::Payload(_) => "payload",
            DeliveryError::Handler(_) => "handler",
        }
    }
}

/// # Errors produced by background task execution.
///
/// Local to the failing unit; the orchestrator does not restart or
/// supervise tasks once they are launched.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Task execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task observed cancellation and exited early.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }
}
