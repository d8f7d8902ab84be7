//! # OS signal bridge.
//!
//! Provides [`wait_for_shutdown_signal`], an async helper that completes when the process
//! receives a termination signal, and [`spawn_signal_bridge`], which turns the first such
//! signal (or the first task failure) into cancellation of the alive signal.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal, often used for core dumps or hard stop)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]
//!
//! ## Bridge
//! ```text
//! select! {
//!   signal received      ─► cancel alive (Signal)
//!   first task failure   ─► cancel alive (TaskFailed)
//!   alive already down   ─► nothing to do
//! }
//! └─► force-exit listener: next signal ─► exit(FORCED_EXIT_CODE)
//! ```
//!
//! Tokio keeps its signal handlers installed for the life of the process, so once the
//! bridge has listened, the default disposition is gone for good. The force-exit listener
//! stands in for it: a second Ctrl-C stops a drain that hangs instead of being swallowed.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::core::alive::{AliveCancel, AliveSignal};
use crate::events::ShutdownReason;

/// Waits for a termination signal and returns its name.
///
/// Each call creates independent signal listeners; they are dropped when the
/// returned future completes or is dropped. The process-wide handlers tokio installs
/// behind them stay, so the signals no longer terminate the process by default.
///
/// Returns `Err` if signal registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = sigint.recv()  => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    Ok(name)
}

/// Waits for a termination signal and returns its name.
///
/// Returns `Err` if signal registration fails.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}

/// Exit status used when a termination signal arrives during shutdown.
pub const FORCED_EXIT_CODE: i32 = 1;

/// Starts the background listener that cancels `alive` on the first termination signal
/// or as soon as `failed` fires, whichever happens first.
///
/// The returned handle completes after that first trigger. A detached force-exit
/// listener then takes over, unless signal handlers could not be installed.
///
/// Must be called from within a tokio runtime.
pub(crate) fn spawn_signal_bridge(
    alive: AliveSignal,
    cancel: AliveCancel,
    failed: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            res = wait_for_shutdown_signal() => match res {
                Ok(signal) => {
                    info!(signal, "signal received");
                    cancel.cancel_with(ShutdownReason::Signal);
                }
                Err(error) => {
                    warn!(%error, "failed to install signal handlers; only task failures will trigger shutdown");
                    tokio::select! {
                        _ = failed.cancelled() => {
                            cancel.cancel_with(ShutdownReason::TaskFailed);
                        }
                        _ = alive.cancelled() => {}
                    }
                    return;
                }
            },
            _ = failed.cancelled() => {
                cancel.cancel_with(ShutdownReason::TaskFailed);
            }
            _ = alive.cancelled() => {}
        }
        drop(tokio::spawn(force_exit_on_signal(|signal| {
            error!(signal, code = FORCED_EXIT_CODE, "signal received during shutdown, exiting now");
            std::process::exit(FORCED_EXIT_CODE)
        })));
    })
}

/// Waits for the next termination signal and hands its name to `on_signal`.
///
/// Does nothing if the listeners cannot be installed.
async fn force_exit_on_signal<F>(on_signal: F)
where
    F: FnOnce(&'static str),
{
    match wait_for_shutdown_signal().await {
        Ok(signal) => on_signal(signal),
        Err(error) => warn!(%error, "failed to install force-exit signal handlers"),
    }
}
