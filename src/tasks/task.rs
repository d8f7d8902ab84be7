//! # Task abstraction.
//!
//! Defines the [`Task`] trait (async, cooperative) for long-running work that wants a
//! stable name in logs and events. Closures can skip the trait entirely and go through
//! [`Coordinator::run`](crate::Coordinator::run).
//!
//! A task receives the [`AliveSignal`] and should start its own shutdown once it is canceled.

use async_trait::async_trait;

use crate::core::AliveSignal;
use crate::error::TaskError;

/// # Named, supervised unit of work.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use lifevisor::{AliveSignal, Task, TaskError};
///
/// struct Flusher;
///
/// #[async_trait]
/// impl Task for Flusher {
///     fn name(&self) -> &str { "log-flusher" }
///
///     async fn run(&self, alive: AliveSignal) -> Result<(), TaskError> {
///         alive.cancelled().await;
///         // flush buffered entries...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Runs until the work is done or the alive signal is canceled.
    ///
    /// Returning an error cancels the alive signal for every other task.
    async fn run(&self, alive: AliveSignal) -> Result<(), TaskError>;
}
