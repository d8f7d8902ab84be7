//! # Coordinator: the public face of the lifecycle runtime.
//!
//! Owns the alive signal, the task supervisor, the event bus, and the terminal phase.
//! Built by [`CoordinatorBuilder`](crate::CoordinatorBuilder) and shared as
//! `Arc<Coordinator>` with every collaborator.
//!
//! ## Typical entry point
//! ```text
//! main()
//!   ├─► coord.run(server loop)      ─┐
//!   ├─► coord.run(log flusher)      ─┼─ each observes coord.alive()
//!   ├─► coord.run(...)              ─┘
//!   ├─► coord.wait()          → first task error (exit status)
//!   └─► coord.after_alive(t)  → Drained | AbortedOnTimeout (exit loudly)
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::CoordinatorConfig;
use crate::core::alive::{AliveCancel, AliveSignal};
use crate::core::builder::CoordinatorBuilder;
use crate::core::drain::{self, DrainSignal, Phase};
use crate::core::supervisor::TaskSupervisor;
use crate::error::{RuntimeError, TaskError};
use crate::events::{Bus, Event};
use crate::tasks::TaskRef;

/// Supervises concurrent task lifetimes and turns signals and failures into one shutdown.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use lifevisor::{Coordinator, CoordinatorConfig, TaskError};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let cfg = CoordinatorConfig { listen_signals: false, ..CoordinatorConfig::default() };
///     let coord = Coordinator::builder(cfg).build();
///
///     coord.run(|alive| async move {
///         alive.cancelled().await;
///         Ok(())
///     });
///     coord.run(|_alive| async { Err(TaskError::fail("config missing")) });
///
///     assert_eq!(coord.wait().await, Err(TaskError::fail("config missing")));
///     coord.after_alive(Duration::from_secs(5)).wait().await.unwrap();
/// }
/// ```
pub struct Coordinator {
    cfg: CoordinatorConfig,
    bus: Bus,
    alive: AliveSignal,
    cancel: AliveCancel,
    tasks: TaskSupervisor,
    terminal: Arc<OnceLock<Phase>>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("phase", &self.phase())
            .field("outstanding", &self.outstanding())
            .field("registered", &self.tasks.registered())
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    /// Returns a builder for the given configuration.
    pub fn builder(cfg: CoordinatorConfig) -> CoordinatorBuilder {
        CoordinatorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: CoordinatorConfig, bus: Bus) -> Self {
        let (alive, cancel) = AliveSignal::new(bus.clone());
        let tasks = TaskSupervisor::new(alive.clone(), cancel.clone(), bus.clone());
        Self {
            cfg,
            bus,
            alive,
            cancel,
            tasks,
            terminal: Arc::new(OnceLock::new()),
        }
    }

    pub(crate) fn parts_for_bridge(&self) -> (AliveSignal, AliveCancel, CancellationToken) {
        (
            self.alive.clone(),
            self.cancel.clone(),
            self.tasks.failed_token(),
        )
    }

    /// Returns the alive signal and the handle that force-cancels it.
    ///
    /// Every call hands out views of the same underlying signal.
    pub fn alive(&self) -> (AliveSignal, AliveCancel) {
        (self.alive.clone(), self.cancel.clone())
    }

    /// Registers `task` and starts it concurrently.
    ///
    /// The task gets the alive signal and should return once it is canceled. Returning an
    /// error cancels the alive signal; the first such error is what [`wait`](Self::wait) yields.
    ///
    /// Must be called from within a tokio runtime. Returns the registration sequence number.
    pub fn run<F, Fut>(&self, task: F) -> u64
    where
        F: FnOnce(AliveSignal) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.tasks.spawn(None, task)
    }

    /// Like [`run`](Self::run), with a name used in logs and events.
    pub fn run_named<F, Fut>(&self, name: impl Into<Cow<'static, str>>, task: F) -> u64
    where
        F: FnOnce(AliveSignal) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.tasks.spawn(Some(name.into()), task)
    }

    /// Registers a [`Task`](crate::Task) implementation.
    pub fn run_task(&self, task: TaskRef) -> u64 {
        let name = task.name().to_string();
        self.tasks
            .spawn(Some(name.into()), move |alive| async move { task.run(alive).await })
    }

    /// Waits until every registered task has returned and yields the first task error.
    ///
    /// With no task ever registered this waits until one is registered and returns.
    pub async fn wait(&self) -> Result<(), TaskError> {
        self.tasks.wait().await
    }

    /// Returns a signal that fires once the alive signal is canceled and all tasks have
    /// returned, or `timeout` after cancellation, whichever comes first.
    ///
    /// The drain is watched by two background tasks. They exit when it resolves or when
    /// the last clone of the returned signal is dropped, whichever happens first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn after_alive(&self, timeout: Duration) -> DrainSignal {
        drain::after_alive(&self.alive, &self.tasks, &self.terminal, &self.bus, timeout)
    }

    /// Waits for shutdown to be requested, then drains with the configured grace period.
    pub async fn drain(&self) -> Result<(), RuntimeError> {
        self.after_alive(self.cfg.grace).wait().await
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        if let Some(phase) = self.terminal.get() {
            return *phase;
        }
        if self.alive.is_cancelled() {
            Phase::ShuttingDown
        } else {
            Phase::Running
        }
    }

    /// Number of registered tasks that have not returned yet.
    pub fn outstanding(&self) -> usize {
        self.tasks.outstanding()
    }

    /// Subscribes to lifecycle events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Configuration this coordinator was built with.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.cfg
    }
}
