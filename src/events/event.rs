//! # Lifecycle events emitted by the coordinator.
//!
//! The [`EventKind`] enum classifies event types across two categories:
//! - **Task events**: supervised task flow (starting, stopped, failed)
//! - **Shutdown events**: alive-signal cancellation and drain outcome
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task name,
//! reasons, and the drain timeout.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use lifevisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_task("flusher")
//!     .with_task_seq(3)
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task.as_deref(), Some("flusher"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Task events ===
    /// Task was registered and is about to run.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `task_seq`: registration order (1-based)
    TaskStarting,

    /// Task returned `Ok(())`.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `task_seq`: registration order
    TaskStopped,

    /// Task returned an error or panicked.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `task_seq`: registration order
    /// - `reason`: error message
    TaskFailed,

    // === Shutdown events ===
    /// The alive signal was canceled.
    ///
    /// Sets:
    /// - `reason`: [`ShutdownReason::as_label`]
    ShutdownRequested,

    /// All tasks returned within the drain timeout.
    ///
    /// Sets:
    /// - `timeout_ms`: configured drain timeout
    AllStoppedWithin,

    /// Drain timeout elapsed with tasks still outstanding.
    ///
    /// Sets:
    /// - `timeout_ms`: configured drain timeout
    /// - `outstanding`: tasks that had not returned
    GraceExceeded,
}

/// What triggered cancellation of the alive signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// An OS termination signal was received.
    Signal,
    /// A supervised task returned an error.
    TaskFailed,
    /// Someone invoked [`AliveCancel::cancel`](crate::AliveCancel::cancel).
    Manual,
}

impl ShutdownReason {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ShutdownReason::Signal => "signal",
            ShutdownReason::TaskFailed => "task_failed",
            ShutdownReason::Manual => "manual",
        }
    }
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the task, if applicable.
    pub task: Option<Arc<str>>,
    /// Registration order of the task (starting from 1).
    pub task_seq: Option<u64>,
    /// Human-readable reason (errors, shutdown trigger).
    pub reason: Option<Arc<str>>,
    /// Drain timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Number of tasks still running when the event was produced.
    pub outstanding: Option<usize>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            task_seq: None,
            reason: None,
            timeout_ms: None,
            outstanding: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches the registration order of a task.
    #[inline]
    pub fn with_task_seq(mut self, n: u64) -> Self {
        self.task_seq = Some(n);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches the outstanding task count.
    #[inline]
    pub fn with_outstanding(mut self, n: usize) -> Self {
        self.outstanding = Some(n);
        self
    }

    /// Creates a shutdown-requested event for the given trigger.
    #[inline]
    pub fn shutdown_requested(reason: ShutdownReason) -> Self {
        Event::new(EventKind::ShutdownRequested).with_reason(reason.as_label())
    }

    /// Returns `true` for shutdown-related kinds.
    #[inline]
    pub fn is_shutdown(&self) -> bool {
        matches!(
            self.kind,
            EventKind::ShutdownRequested | EventKind::AllStoppedWithin | EventKind::GraceExceeded
        )
    }
}
