//! # Process-wide coordinator.
//!
//! Thin convenience layer over one lazily built [`Coordinator`] with the default
//! [`CoordinatorConfig`] (signal bridge enabled). Initialization happens exactly once, on
//! first use, and must happen inside a tokio runtime that lives as long as the process.
//!
//! Programs that need a custom configuration, or more than one runtime, should build
//! their own coordinator and pass the `Arc` around instead.
//!
//! ```text
//! lifevisor::run(f)          ─┐
//! lifevisor::alive()          ├─► global() ─► OnceLock<Arc<Coordinator>>
//! lifevisor::wait()           │
//! lifevisor::after_alive(t)  ─┘
//! ```

use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::config::CoordinatorConfig;
use crate::core::{AliveCancel, AliveSignal, Coordinator, CoordinatorBuilder, DrainSignal};
use crate::error::TaskError;

static GLOBAL: OnceLock<Arc<Coordinator>> = OnceLock::new();

/// Returns the process-wide coordinator, building it on first call.
///
/// # Panics
/// Panics if the first call happens outside a tokio runtime.
pub fn global() -> &'static Arc<Coordinator> {
    GLOBAL.get_or_init(|| CoordinatorBuilder::new(CoordinatorConfig::default()).build())
}

/// [`Coordinator::alive`] on the process-wide coordinator.
pub fn alive() -> (AliveSignal, AliveCancel) {
    global().alive()
}

/// [`Coordinator::run`] on the process-wide coordinator.
pub fn run<F, Fut>(task: F) -> u64
where
    F: FnOnce(AliveSignal) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    global().run(task)
}

/// [`Coordinator::wait`] on the process-wide coordinator.
pub async fn wait() -> Result<(), TaskError> {
    global().wait().await
}

/// [`Coordinator::after_alive`] on the process-wide coordinator.
pub fn after_alive(timeout: Duration) -> DrainSignal {
    global().after_alive(timeout)
}
