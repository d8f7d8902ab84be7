//! # lifevisor
//!
//! **Lifevisor** is a small process lifecycle coordinator for tokio programs.
//!
//! Independent long-running tasks (server loops, log flushers, pollers) register with a
//! [`Coordinator`], run concurrently, and shut down together when the process receives a
//! termination signal or any one of them fails. The entry point then learns the first
//! task error and whether everything drained within a bounded time.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  task #1     │   │  task #2     │   │  task #3     │
//!     │ (server)     │   │ (flusher)    │   │ (poller)     │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Coordinator                                                      │
//! │  - AliveSignal (shared CancellationToken, canceled once)          │
//! │  - TaskSupervisor (outstanding count, first-error-wins)           │
//! │  - Signal bridge (SIGINT/SIGTERM/SIGQUIT → cancel alive)          │
//! │  - Bus (broadcast lifecycle events)                               │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   coord.wait()     coord.after_alive(t)   coord.subscribe()
//!   first error      Drained | Aborted      Event stream
//! ```
//!
//! ### Lifecycle
//! ```text
//! Running ──(signal | task error | AliveCancel::cancel)──► ShuttingDown
//!   ShuttingDown ──(outstanding == 0 within timeout)──────► Drained
//!   ShuttingDown ──(timeout, tasks still running)─────────► AbortedOnTimeout (fatal)
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types                                  |
//! |-------------------|-----------------------------------------------------------------|--------------------------------------------|
//! | **Alive signal**  | Shared cancellation observed by every task and collaborator.    | [`AliveSignal`], [`AliveCancel`]           |
//! | **Supervision**   | Concurrent tasks, outstanding count, first error wins.          | [`Coordinator`]                            |
//! | **Drain**         | Bounded wait for tasks after shutdown is requested.             | [`DrainSignal`], [`DrainOutcome`], [`Phase`]|
//! | **Errors**        | Typed errors for tasks and the coordinator.                     | [`TaskError`], [`RuntimeError`]            |
//! | **Tasks**         | Closures, or named tasks behind a trait.                        | [`Task`], [`TaskFn`], [`TaskRef`]          |
//! | **Events**        | Lifecycle event stream.                                         | [`Event`], [`EventKind`]                   |
//! | **Configuration** | Grace period, signal bridge, bus capacity.                      | [`CoordinatorConfig`]                      |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use lifevisor::{Coordinator, CoordinatorConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let coord = Coordinator::builder(CoordinatorConfig::default()).build();
//!
//!     coord.run_named("ticker", |alive| async move {
//!         while !alive.is_cancelled() {
//!             tokio::time::sleep(Duration::from_millis(10)).await;
//!         }
//!         Ok(())
//!     });
//!
//!     // Normally an OS signal does this.
//!     let (_alive, cancel) = coord.alive();
//!     cancel.cancel();
//!
//!     coord.after_alive(Duration::from_secs(5)).wait().await?;
//!     coord.wait().await?;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod global;
mod tasks;

// ---- Public re-exports ----

pub use config::CoordinatorConfig;
pub use self::core::{
    AliveCancel, AliveSignal, Coordinator, CoordinatorBuilder, DrainOutcome, DrainSignal,
    FORCED_EXIT_CODE, Phase, wait_for_shutdown_signal,
};
pub use error::{RuntimeError, TaskError};
pub use events::{Event, EventKind, ShutdownReason};
pub use global::{after_alive, alive, global, run, wait};
pub use tasks::{Task, TaskFn, TaskRef};
