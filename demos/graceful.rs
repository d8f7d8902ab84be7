//! # Example: graceful
//!
//! Three tasks on the process-wide coordinator, ending in a coordinated shutdown.
//!
//! Demonstrates how to:
//! - Register tasks with [`lifevisor::run`] and observe the alive signal.
//! - Turn one task failure into shutdown of the others.
//! - Bound the drain with [`lifevisor::after_alive`] and exit loudly on timeout.
//!
//! ## Flow
//! ```text
//! main ──► run(task 1: waits for alive canceled)
//!      ──► run(task 2: does its work, returns Ok)
//!      ──► run(task 3: returns Err after a rendezvous)
//!             └─► alive canceled ──► task 1 returns
//!      ──► after_alive(10s) ──► Drained
//!      ──► wait() ──► task 3's error ──► exit code 1
//! ```
//!
//! Press Ctrl-C before the rendezvous to see a signal-driven shutdown instead.
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example graceful
//! ```

use std::process::ExitCode;
use std::time::Duration;

use lifevisor::TaskError;
use tokio::sync::oneshot;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let (ready_tx, ready_rx) = oneshot::channel::<()>();

    lifevisor::run(|alive| async move {
        info!("1 started");
        alive.cancelled().await;
        info!("1 stopped: alive signal canceled");
        Ok(())
    });

    lifevisor::run(|_alive| async move {
        info!("2 started");
        tokio::time::sleep(Duration::from_millis(200)).await;
        info!("2 stopped: work complete");
        let _ = ready_tx.send(());
        Ok(())
    });

    lifevisor::run(|alive| async move {
        info!("3 started");
        tokio::select! {
            _ = ready_rx => {}
            _ = alive.cancelled() => return Ok(()),
        }
        info!("3 stopped: error");
        Err(TaskError::fail("rendezvous reached"))
    });

    lifevisor::after_alive(Duration::from_secs(10))
        .wait_or_abort()
        .await;
    info!("cleanup complete");

    match lifevisor::wait().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            info!(error = %err, "exiting with failure");
            ExitCode::FAILURE
        }
    }
}
