//! # Drain waiter: "is it safe to exit yet?"
//!
//! [`Coordinator::after_alive`](crate::Coordinator::after_alive) returns a [`DrainSignal`]
//! that fires once the alive signal is canceled **and** every task has returned, or once
//! the timeout elapses after cancellation, whichever comes first.
//!
//! ## Architecture
//! ```text
//!                 ┌─ timeout waiter: alive.cancelled() → sleep(timeout) ─┐
//! after_alive() ──┤                                                      ├──► finish(outcome)
//!                 └─ count waiter:   alive.cancelled() → outstanding==0 ─┘       ├─ outcome.set() (first wins)
//!                                                                                ├─ phase.set()
//!                                                                                └─ token.cancel()
//! ```
//!
//! ## Rules
//! - Exactly one outcome is recorded; the losing waiter sees the canceled token and exits
//! - The outcome is recorded **before** the token is canceled
//! - A timeout is fatal: it is logged at error level and surfaced as
//!   [`RuntimeError::ShutdownTimeout`], never as a task error
//! - Dropping every clone of a [`DrainSignal`] stops both waiters; nothing is recorded then

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::time;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{error, info};

use crate::core::alive::AliveSignal;
use crate::core::supervisor::TaskSupervisor;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};

/// Lifecycle phase of a coordinator.
///
/// ```text
/// Running ──(signal | task error | manual cancel)──► ShuttingDown
/// ShuttingDown ──(all tasks returned in time)──────► Drained
/// ShuttingDown ──(timeout, tasks outstanding)──────► AbortedOnTimeout
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Phase {
    /// Alive signal is active.
    Running,
    /// Alive signal is canceled; tasks are draining.
    ShuttingDown,
    /// Every task returned within the drain timeout. Terminal.
    Drained,
    /// Drain timeout elapsed with tasks still running. Terminal.
    AbortedOnTimeout,
}

impl Phase {
    /// Returns `true` for `Drained` and `AbortedOnTimeout`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Drained | Phase::AbortedOnTimeout)
    }
}

/// How a drain waiter resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DrainOutcome {
    /// Alive was canceled and all tasks returned.
    Drained,
    /// Timeout elapsed after cancellation with tasks still running.
    AbortedOnTimeout {
        /// The timeout that elapsed.
        timeout: Duration,
        /// Tasks still running at that moment.
        outstanding: usize,
    },
}

impl DrainOutcome {
    fn phase(&self) -> Phase {
        match self {
            DrainOutcome::Drained => Phase::Drained,
            DrainOutcome::AbortedOnTimeout { .. } => Phase::AbortedOnTimeout,
        }
    }
}

/// Signal returned by `after_alive`.
///
/// Clones share one drain. Once the last clone is dropped the waiters behind it exit.
#[derive(Clone, Debug)]
pub struct DrainSignal {
    token: CancellationToken,
    outcome: Arc<OnceLock<DrainOutcome>>,
    _abandon: Arc<DropGuard>,
}

impl DrainSignal {
    /// Returns `true` once the drain resolved (either way).
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once the drain resolved (either way).
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// The outcome, if already resolved.
    pub fn outcome(&self) -> Option<DrainOutcome> {
        self.outcome.get().copied()
    }

    /// Waits for the drain to resolve.
    ///
    /// Returns [`RuntimeError::ShutdownTimeout`] if tasks were still running when the
    /// timeout elapsed. Callers must treat that as fatal and exit.
    pub async fn wait(&self) -> Result<(), RuntimeError> {
        self.token.cancelled().await;
        match self.outcome() {
            Some(DrainOutcome::AbortedOnTimeout {
                timeout,
                outstanding,
            }) => Err(RuntimeError::ShutdownTimeout {
                timeout,
                outstanding,
            }),
            Some(DrainOutcome::Drained) | None => Ok(()),
        }
    }

    /// Waits for the drain and aborts the process if it timed out.
    pub async fn wait_or_abort(&self) {
        if let Err(err) = self.wait().await {
            error!(error = %err, label = err.as_label(), "aborting process");
            std::process::abort();
        }
    }
}

/// Shared state both racing waiters write into.
struct Race {
    token: CancellationToken,
    outcome: Arc<OnceLock<DrainOutcome>>,
    phase: Arc<OnceLock<Phase>>,
    bus: Bus,
    timeout: Duration,
}

impl Race {
    fn finish(&self, outcome: DrainOutcome) {
        if self.outcome.set(outcome).is_ok() {
            let _ = self.phase.set(outcome.phase());
            match outcome {
                DrainOutcome::Drained => {
                    info!(timeout = ?self.timeout, "all tasks stopped, drain complete");
                    self.bus
                        .publish(Event::new(EventKind::AllStoppedWithin).with_timeout(self.timeout));
                }
                DrainOutcome::AbortedOnTimeout { outstanding, .. } => {
                    error!(
                        timeout = ?self.timeout,
                        outstanding,
                        "program failed to shut down gracefully"
                    );
                    self.bus.publish(
                        Event::new(EventKind::GraceExceeded)
                            .with_timeout(self.timeout)
                            .with_outstanding(outstanding),
                    );
                }
            }
        }
        self.token.cancel();
    }
}

/// Starts both waiters and returns the signal they resolve.
///
/// Must be called from within a tokio runtime.
pub(crate) fn after_alive(
    alive: &AliveSignal,
    tasks: &TaskSupervisor,
    phase: &Arc<OnceLock<Phase>>,
    bus: &Bus,
    timeout: Duration,
) -> DrainSignal {
    let abandoned = CancellationToken::new();
    let signal = DrainSignal {
        token: CancellationToken::new(),
        outcome: Arc::new(OnceLock::new()),
        _abandon: Arc::new(abandoned.clone().drop_guard()),
    };
    let race = Arc::new(Race {
        token: signal.token.clone(),
        outcome: Arc::clone(&signal.outcome),
        phase: Arc::clone(phase),
        bus: bus.clone(),
        timeout,
    });

    {
        let race = Arc::clone(&race);
        let abandoned = abandoned.clone();
        let alive = alive.clone();
        let tasks = tasks.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = race.token.cancelled() => return,
                _ = abandoned.cancelled() => return,
                _ = async {
                    alive.cancelled().await;
                    time::sleep(race.timeout).await;
                } => {}
            }
            let outstanding = tasks.outstanding();
            if outstanding == 0 {
                race.finish(DrainOutcome::Drained);
            } else {
                race.finish(DrainOutcome::AbortedOnTimeout {
                    timeout: race.timeout,
                    outstanding,
                });
            }
        });
    }

    {
        let alive = alive.clone();
        let tasks = tasks.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = race.token.cancelled() => return,
                _ = abandoned.cancelled() => return,
                _ = async {
                    alive.cancelled().await;
                    tasks.wait_idle().await;
                } => {}
            }
            race.finish(DrainOutcome::Drained);
        });
    }

    signal
}
