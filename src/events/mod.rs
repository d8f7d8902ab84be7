//! Lifecycle events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`], [`ShutdownReason`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: task wrappers in the supervisor, [`AliveCancel`](crate::AliveCancel),
//!   the OS signal bridge, drain waiters.
//! - **Consumers**: whoever holds a receiver from `Coordinator::subscribe()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind, ShutdownReason};
