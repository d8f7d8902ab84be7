//! Error types used by the lifecycle coordinator and supervised tasks.
//!
//! This module defines two main error enums:
//!
//! - [`RuntimeError`] — errors raised by the coordinator itself (shutdown did not drain).
//! - [`TaskError`] — errors raised by individual tasks; the first one becomes the
//!   aggregate result returned by [`Coordinator::wait`](crate::Coordinator::wait).
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the coordinator.
///
/// These are not recoverable: a process that observes one is expected to exit loudly.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Drain timeout elapsed after the alive signal was canceled while tasks were still running.
    #[error("failed to shut down gracefully within {timeout:?}; {outstanding} task(s) still running")]
    ShutdownTimeout {
        /// The configured drain timeout.
        timeout: Duration,
        /// Tasks that had not returned when the timeout fired.
        outstanding: usize,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use lifevisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::ShutdownTimeout { timeout: Duration::from_secs(5), outstanding: 1 };
    /// assert_eq!(err.as_label(), "runtime_shutdown_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::ShutdownTimeout { .. } => "runtime_shutdown_timeout",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::ShutdownTimeout {
                timeout,
                outstanding,
            } => {
                format!("drain timeout {timeout:?} exceeded; outstanding tasks={outstanding}")
            }
        }
    }
}

/// # Errors produced by supervised tasks.
///
/// Any variant returned from a task cancels the alive signal. `Clone` so the
/// aggregate result can be handed to every caller of `wait`.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task hit a condition it considers fatal for the whole process.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Task panicked; the panic was caught by the supervisor.
    #[error("task {task} panicked: {info}")]
    Panicked {
        /// Name of the task that panicked.
        task: String,
        /// Panic payload, when it was a string.
        info: String,
    },

    /// Task gave up because the alive signal was canceled.
    ///
    /// Returning this still counts as a failure for first-error-wins; tasks that
    /// shut down cleanly should return `Ok(())`.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`] from anything displayable.
    ///
    /// # Example
    /// ```
    /// use lifevisor::TaskError;
    ///
    /// let err = TaskError::fail("disk full");
    /// assert_eq!(err.to_string(), "execution failed: disk full");
    /// ```
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Shorthand for [`TaskError::Fatal`] from anything displayable.
    pub fn fatal(error: impl std::fmt::Display) -> Self {
        TaskError::Fatal {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use lifevisor::TaskError;
    ///
    /// let err = TaskError::Canceled;
    /// assert_eq!(err.as_label(), "task_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Fatal { error } => format!("fatal: {error}"),
            TaskError::Panicked { task, info } => format!("panic in {task}: {info}"),
            TaskError::Canceled => "context cancelled".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(TaskError::fail("x").as_label(), "task_failed");
        assert_eq!(TaskError::fatal("x").as_label(), "task_fatal");
        assert_eq!(
            TaskError::Panicked {
                task: "t".into(),
                info: "boom".into()
            }
            .as_label(),
            "task_panicked"
        );
    }

    #[test]
    fn test_shutdown_timeout_display() {
        let err = RuntimeError::ShutdownTimeout {
            timeout: Duration::from_millis(100),
            outstanding: 2,
        };
        assert_eq!(
            err.to_string(),
            "failed to shut down gracefully within 100ms; 2 task(s) still running"
        );
        assert_eq!(
            err.as_message(),
            "drain timeout 100ms exceeded; outstanding tasks=2"
        );
    }
}
