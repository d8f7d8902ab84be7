//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(AliveSignal) -> Fut` and gives it a name, so it can be
//! passed around as a [`TaskRef`] and registered with
//! [`Coordinator::run_task`](crate::Coordinator::run_task).
//!
//! ## Example
//! ```rust
//! use lifevisor::{AliveSignal, TaskError, TaskFn, TaskRef};
//!
//! let t: TaskRef = TaskFn::arc("server", |alive: AliveSignal| async move {
//!     alive.cancelled().await;
//!     Ok::<_, TaskError>(())
//! });
//!
//! assert_eq!(t.name(), "server");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::AliveSignal;
use crate::error::TaskError;
use crate::tasks::task::Task;

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// Function-backed task implementation.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Task for TaskFn<F>
where
    F: Fn(AliveSignal) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, alive: AliveSignal) -> Result<(), TaskError> {
        (self.f)(alive).await
    }
}
