use std::sync::Arc;

use crate::{config::CoordinatorConfig, events::Bus};

use super::{coordinator::Coordinator, shutdown};

/// Builder for constructing a [`Coordinator`].
#[derive(Debug)]
pub struct CoordinatorBuilder {
    cfg: CoordinatorConfig,
}

impl CoordinatorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: CoordinatorConfig) -> Self {
        Self { cfg }
    }

    /// Overrides [`CoordinatorConfig::listen_signals`].
    pub fn with_signals(mut self, listen: bool) -> Self {
        self.cfg.listen_signals = listen;
        self
    }

    /// Builds the coordinator.
    ///
    /// Initializes the event bus, the alive signal, and the task supervisor, then starts
    /// the OS signal bridge if enabled.
    ///
    /// # Panics
    /// Panics if signals are enabled and this is called outside a tokio runtime.
    pub fn build(self) -> Arc<Coordinator> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let listen = self.cfg.listen_signals;
        let coord = Arc::new(Coordinator::new_internal(self.cfg, bus));

        if listen {
            let (alive, cancel, failed) = coord.parts_for_bridge();
            // Detached: it exits on its own once the alive signal is canceled.
            drop(shutdown::spawn_signal_bridge(alive, cancel, failed));
        }
        coord
    }
}
