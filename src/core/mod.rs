//! Runtime core: the lifecycle coordinator.
//!
//! Public API from this module: [`Coordinator`], [`CoordinatorBuilder`], the alive signal
//! handles, and the drain types.
//!
//! Internal modules:
//! - [`alive`]: the shared "keep running" signal and its cancel handle;
//! - [`supervisor`]: runs tasks, counts outstanding ones, records the first error;
//! - [`shutdown`]: cross-platform OS signal bridge;
//! - [`drain`]: races "all tasks returned" against a timeout after cancellation;
//! - [`coordinator`] / [`builder`]: wiring.
//!
//! ```text
//! Alive signal ──► OS signal bridge
//!      │                 ▲
//!      ▼                 │ (first failure)
//! Task supervisor ───────┘
//!      │
//!      ▼
//! Drain waiter (alive canceled && outstanding == 0 | timeout)
//! ```

mod alive;
mod builder;
mod coordinator;
mod drain;
mod shutdown;
mod supervisor;

pub use alive::{AliveCancel, AliveSignal};
pub use builder::CoordinatorBuilder;
pub use coordinator::Coordinator;
pub use drain::{DrainOutcome, DrainSignal, Phase};
pub use shutdown::{FORCED_EXIT_CODE, wait_for_shutdown_signal};
