//! # Coordinator configuration.
//!
//! Provides [`CoordinatorConfig`], the settings consumed by
//! [`CoordinatorBuilder`](crate::CoordinatorBuilder).
//!
//! ## Sentinel values
//! - `grace = 0s` → [`Coordinator::drain`](crate::Coordinator::drain) gives tasks no time at all
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

/// Configuration for the lifecycle coordinator.
///
/// ## Field semantics
/// - `grace`: Drain timeout used by `Coordinator::drain`
/// - `listen_signals`: Whether to start the OS signal bridge on build
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    /// Maximum time to wait for tasks to return after the alive signal is canceled.
    ///
    /// Exceeding it is fatal: the drain outcome becomes `AbortedOnTimeout`.
    pub grace: Duration,

    /// Start the OS signal bridge (SIGINT/SIGTERM/SIGQUIT, Ctrl-C on Windows).
    ///
    /// Disable when the embedding program handles signals itself, or in tests.
    pub listen_signals: bool,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl CoordinatorConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for CoordinatorConfig {
    /// Default configuration:
    ///
    /// - `grace = 60s`
    /// - `listen_signals = true`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(60),
            listen_signals: true,
            bus_capacity: 1024,
        }
    }
}
