//! # Alive signal: "the process should keep running".
//!
//! A read-only view ([`AliveSignal`]) and a cancel handle ([`AliveCancel`]) over one
//! shared [`CancellationToken`]. Canceling it is the only way to start a coordinated shutdown.
//!
//! ## Architecture
//! ```text
//!   AliveCancel::cancel()          ─┐
//!   TaskSupervisor (first failure) ─┼──► cancel_with(reason) ──► CancellationToken::cancel()
//!   Signal bridge (SIGINT/SIGTERM) ─┘         │                          │
//!                                             ▼                          ▼
//!                                  reason recorded once       every AliveSignal observes
//!                                  ShutdownRequested event    the same canceled state
//! ```
//!
//! ## Rules
//! - Active → Canceled happens exactly once; later cancel attempts are no-ops
//! - The first effective trigger wins the [`ShutdownReason`]
//! - No cancel call returns before the signal reads as canceled, even one that lost the race
//! - An `AliveSignal` cannot cancel anything; children it hands out are
//!   canceled with it but never cancel it back

use std::sync::{Arc, OnceLock};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::info;

use crate::events::{Bus, Event, ShutdownReason};

struct AliveInner {
    token: CancellationToken,
    reason: OnceLock<ShutdownReason>,
    bus: Bus,
}

/// Shared "keep running" signal handed to every task and collaborator.
///
/// Cheap to clone; all clones observe the same state.
#[derive(Clone)]
pub struct AliveSignal {
    inner: Arc<AliveInner>,
}

impl std::fmt::Debug for AliveSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliveSignal")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}

impl AliveSignal {
    /// Creates a fresh, active signal together with its cancel handle.
    pub(crate) fn new(bus: Bus) -> (Self, AliveCancel) {
        let inner = Arc::new(AliveInner {
            token: CancellationToken::new(),
            reason: OnceLock::new(),
            bus,
        });
        let cancel = AliveCancel {
            inner: Arc::clone(&inner),
        };
        (Self { inner }, cancel)
    }

    /// Returns `true` once shutdown has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Completes when shutdown has been requested.
    ///
    /// Completes immediately if it already was.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.inner.token.cancelled()
    }

    /// Owned variant of [`cancelled`](Self::cancelled), for futures that must be `'static`
    /// (e.g. a server's graceful-shutdown future).
    pub async fn cancelled_owned(self) {
        self.inner.token.cancelled().await
    }

    /// Returns a token that is canceled together with the alive signal.
    ///
    /// Canceling the child does not affect the alive signal, so it can be handed to
    /// APIs that take a `CancellationToken` and might cancel it themselves.
    pub fn child_token(&self) -> CancellationToken {
        self.inner.token.child_token()
    }

    /// What triggered the shutdown, if it has been requested.
    pub fn reason(&self) -> Option<ShutdownReason> {
        self.inner.reason.get().copied()
    }
}

/// Handle that force-cancels the alive signal.
#[derive(Clone)]
pub struct AliveCancel {
    inner: Arc<AliveInner>,
}

impl std::fmt::Debug for AliveCancel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliveCancel").finish_non_exhaustive()
    }
}

impl AliveCancel {
    /// Requests shutdown. Safe to call any number of times from any thread.
    pub fn cancel(&self) {
        self.cancel_with(ShutdownReason::Manual);
    }

    /// Cancels with an explicit trigger.
    ///
    /// Returns `true` only for the call that recorded the reason. Every caller leaves the
    /// signal canceled on return, including the ones that lost the race.
    pub(crate) fn cancel_with(&self, reason: ShutdownReason) -> bool {
        let first = self.inner.reason.set(reason).is_ok();
        self.inner.token.cancel();
        if first {
            info!(reason = reason.as_label(), "alive signal canceled, shutting down");
            self.inner.bus.publish(Event::shutdown_requested(reason));
        }
        first
    }
}
