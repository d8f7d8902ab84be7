//! # Task supervisor: concurrent tasks, one aggregate result.
//!
//! Runs every registered task on its own tokio task, counts the ones still running,
//! and turns the first failure into a shutdown of everything else.
//!
//! ## Architecture
//! ```text
//! run(f) ──► register()  (registered += 1, outstanding += 1)
//!              └─► tokio::spawn(
//!                    OutstandingGuard ─────────────────────────────┐
//!                    catch_unwind(f(alive)) ──► complete(result)   │
//!                                                 ├─ Ok  → TaskStopped
//!                                                 └─ Err → TaskFailed
//!                                                          first_error.set(e)  (first wins)
//!                                                          failed.cancel()
//!                                                          alive cancel (TaskFailed)
//!                  )                                               │
//!                  guard dropped on every exit path ◄──────────────┘
//!                     └─► outstanding -= 1  (watch channel notifies waiters)
//!
//! wait() ──► progress.wait_for(registered > 0 && outstanding == 0) ──► first_error
//! ```
//!
//! ## Rules
//! - The outstanding count is raised **before** the task is spawned and lowered by a
//!   drop guard, so it is released on success, failure, panic, or runtime teardown
//! - The error is recorded **before** the count drops, so a waiter woken by
//!   `outstanding == 0` always sees it
//! - Later errors are logged and discarded, never accumulated
//! - `wait()` with nothing ever registered blocks until something is

use std::borrow::Cow;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};

use futures::FutureExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::alive::{AliveCancel, AliveSignal};
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind, ShutdownReason};

/// Snapshot of task bookkeeping carried by the watch channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Progress {
    /// Tasks registered so far (never decreases).
    pub registered: u64,
    /// Tasks that have not returned yet.
    pub outstanding: usize,
}

/// Releases one outstanding slot when dropped.
struct OutstandingGuard {
    progress: Arc<watch::Sender<Progress>>,
}

impl Drop for OutstandingGuard {
    fn drop(&mut self) {
        self.progress
            .send_modify(|p| p.outstanding = p.outstanding.saturating_sub(1));
    }
}

/// Supervises concurrently running tasks.
#[derive(Clone)]
pub(crate) struct TaskSupervisor {
    alive: AliveSignal,
    cancel: AliveCancel,
    bus: Bus,
    progress: Arc<watch::Sender<Progress>>,
    first_error: Arc<OnceLock<TaskError>>,
    /// Canceled on the first task failure; watched by the signal bridge.
    failed: CancellationToken,
}

impl TaskSupervisor {
    pub(crate) fn new(alive: AliveSignal, cancel: AliveCancel, bus: Bus) -> Self {
        let (tx, _rx) = watch::channel(Progress::default());
        Self {
            alive,
            cancel,
            bus,
            progress: Arc::new(tx),
            first_error: Arc::new(OnceLock::new()),
            failed: CancellationToken::new(),
        }
    }

    /// Internal "a task failed" signal.
    pub(crate) fn failed_token(&self) -> CancellationToken {
        self.failed.clone()
    }

    /// Registers `f` and starts it on a new tokio task.
    ///
    /// `name` is `None` for anonymous tasks, which are named `task-<seq>`.
    pub(crate) fn spawn<F, Fut>(&self, name: Option<Cow<'static, str>>, f: F) -> u64
    where
        F: FnOnce(AliveSignal) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        let seq = self.register();
        let guard = OutstandingGuard {
            progress: Arc::clone(&self.progress),
        };
        let name: Arc<str> = match name {
            Some(n) => Arc::from(n.as_ref()),
            None => Arc::from(format!("task-{seq}")),
        };

        debug!(task = %name, seq, "task starting");
        self.bus.publish(
            Event::new(EventKind::TaskStarting)
                .with_task(Arc::clone(&name))
                .with_task_seq(seq),
        );

        let me = self.clone();
        let alive = self.alive.clone();
        tokio::spawn(async move {
            let _guard = guard;
            let res = AssertUnwindSafe(async move { f(alive).await })
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    Err(TaskError::Panicked {
                        task: name.to_string(),
                        info: panic_message(panic.as_ref()),
                    })
                });
            me.complete(&name, seq, res);
        });
        seq
    }

    /// Raises both counters; returns the registration sequence number (1-based).
    fn register(&self) -> u64 {
        let mut seq = 0;
        self.progress.send_modify(|p| {
            p.registered += 1;
            p.outstanding += 1;
            seq = p.registered;
        });
        seq
    }

    /// Records a task's result. Runs before its outstanding slot is released.
    fn complete(&self, name: &Arc<str>, seq: u64, res: Result<(), TaskError>) {
        let err = match res {
            Ok(()) => {
                debug!(task = %name, seq, "task stopped");
                self.bus.publish(
                    Event::new(EventKind::TaskStopped)
                        .with_task(Arc::clone(name))
                        .with_task_seq(seq),
                );
                return;
            }
            Err(e) => e,
        };

        warn!(task = %name, seq, error = %err, label = err.as_label(), "task failed");
        self.bus.publish(
            Event::new(EventKind::TaskFailed)
                .with_task(Arc::clone(name))
                .with_task_seq(seq)
                .with_reason(err.to_string()),
        );

        if let Err(later) = self.first_error.set(err) {
            debug!(task = %name, error = %later, "discarding error, an earlier one was recorded");
        }
        self.failed.cancel();
        self.cancel.cancel_with(ShutdownReason::TaskFailed);
    }

    /// Waits for every registered task to return and yields the first error.
    pub(crate) async fn wait(&self) -> Result<(), TaskError> {
        let mut rx = self.progress.subscribe();
        // The sender lives in `self`, so this only returns once the condition holds.
        let _ = rx
            .wait_for(|p| p.registered > 0 && p.outstanding == 0)
            .await;
        match self.first_error.get() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Waits until no task is running (immediately if none ever was).
    pub(crate) async fn wait_idle(&self) {
        let mut rx = self.progress.subscribe();
        let _ = rx.wait_for(|p| p.outstanding == 0).await;
    }

    /// Number of tasks that have not returned yet.
    pub(crate) fn outstanding(&self) -> usize {
        self.progress.borrow().outstanding
    }

    /// Number of tasks registered so far.
    pub(crate) fn registered(&self) -> u64 {
        self.progress.borrow().registered
    }
}

/// Extracts a printable message from a panic payload.
fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn supervisor() -> (TaskSupervisor, AliveSignal) {
        let bus = Bus::new(64);
        let (alive, cancel) = AliveSignal::new(bus.clone());
        (TaskSupervisor::new(alive.clone(), cancel, bus), alive)
    }

    #[tokio::test]
    async fn test_counts_return_to_zero() {
        let (sup, alive) = supervisor();
        for _ in 0..5 {
            sup.spawn(None, |_alive| async { Ok(()) });
        }
        assert_eq!(sup.wait().await, Ok(()));
        assert_eq!(sup.outstanding(), 0);
        assert_eq!(sup.registered(), 5);
        assert!(!alive.is_cancelled());
    }

    #[tokio::test]
    async fn test_first_error_wins() {
        let (sup, alive) = supervisor();
        sup.spawn(None, |_alive| async { Err(TaskError::fail("first")) });
        alive.cancelled().await;
        sup.spawn(None, |_alive| async { Err(TaskError::fail("second")) });

        assert_eq!(sup.wait().await, Err(TaskError::fail("first")));
        assert!(sup.failed_token().is_cancelled());
        assert_eq!(alive.reason(), Some(ShutdownReason::TaskFailed));
    }

    #[tokio::test]
    async fn test_panic_is_a_failure_and_releases_slot() {
        let (sup, alive) = supervisor();
        sup.spawn(Some("boom".into()), |_alive| async {
            if true {
                panic!("kaboom");
            }
            Ok(())
        });

        let err = sup.wait().await.unwrap_err();
        assert_eq!(
            err,
            TaskError::Panicked {
                task: "boom".into(),
                info: "kaboom".into()
            }
        );
        assert_eq!(sup.outstanding(), 0);
        assert!(alive.is_cancelled());
    }

    #[tokio::test]
    async fn test_registered_before_spawned_task_runs() {
        let (sup, _alive) = supervisor();
        let seq = sup.spawn(None, |alive| async move {
            alive.cancelled().await;
            Ok(())
        });
        assert_eq!(seq, 1);
        assert_eq!(sup.outstanding(), 1);
        assert_eq!(sup.registered(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_without_tasks_blocks() {
        let (sup, _alive) = supervisor();
        let res = tokio::time::timeout(Duration::from_secs(3600), sup.wait()).await;
        assert!(res.is_err(), "wait() must block while nothing is registered");

        sup.spawn(None, |_alive| async { Ok(()) });
        assert_eq!(sup.wait().await, Ok(()));
    }

    #[tokio::test]
    async fn test_wait_idle_without_tasks_is_immediate() {
        let (sup, _alive) = supervisor();
        sup.wait_idle().await;
    }
}
