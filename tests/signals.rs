//! These tests deliver real signals to the test process, so they live in their own binary.
//! The forced-exit scenario runs in a child copy of this binary so the exit cannot take the
//! harness down with it.

#![cfg(unix)]

use std::process::Command;
use std::time::Duration;

use lifevisor::{Coordinator, CoordinatorConfig, DrainOutcome, FORCED_EXIT_CODE, ShutdownReason};
use nix::sys::signal::{Signal, raise};
use tokio::signal::unix::{SignalKind, signal};

const CHILD_ENV: &str = "LIFEVISOR_FORCED_EXIT_CHILD";

fn coordinator_with_signals() -> std::sync::Arc<Coordinator> {
    let cfg = CoordinatorConfig {
        listen_signals: true,
        ..CoordinatorConfig::default()
    };
    Coordinator::builder(cfg).build()
}

#[tokio::test]
async fn sigterm_cancels_alive_and_drains() {
    // Installs tokio's handler up front, so SIGTERM can never hit the default disposition.
    let _sigterm = signal(SignalKind::terminate()).unwrap();

    let coord = coordinator_with_signals();
    coord.run(|alive| async move {
        alive.cancelled().await;
        Ok(())
    });
    // Lets the bridge register its listeners.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (alive, _) = coord.alive();
    assert!(!alive.is_cancelled());
    raise(Signal::SIGTERM).unwrap();

    tokio::time::timeout(Duration::from_secs(5), alive.cancelled())
        .await
        .expect("SIGTERM did not cancel the alive signal");
    assert_eq!(alive.reason(), Some(ShutdownReason::Signal));

    let drain = coord.after_alive(Duration::from_secs(5));
    drain.wait().await.unwrap();
    assert_eq!(drain.outcome(), Some(DrainOutcome::Drained));
    assert_eq!(coord.wait().await, Ok(()));
}

#[test]
fn second_signal_forces_exit() {
    let status = Command::new(std::env::current_exe().unwrap())
        .args(["forced_exit_child", "--exact", "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, "1")
        .status()
        .unwrap();
    assert_eq!(
        status.code(),
        Some(FORCED_EXIT_CODE),
        "child should exit on the second signal, got {status:?}"
    );
}

/// Body of [`second_signal_forces_exit`]; a no-op unless started as its child.
#[tokio::test]
async fn forced_exit_child() {
    if std::env::var_os(CHILD_ENV).is_none() {
        return;
    }
    let _sigterm = signal(SignalKind::terminate()).unwrap();

    let coord = coordinator_with_signals();
    coord.run(|_alive| async {
        std::future::pending::<()>().await;
        Ok(())
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (alive, _) = coord.alive();
    raise(Signal::SIGTERM).unwrap();
    tokio::time::timeout(Duration::from_secs(5), alive.cancelled())
        .await
        .expect("first SIGTERM did not cancel the alive signal");

    // Lets the force-exit listener register.
    tokio::time::sleep(Duration::from_millis(50)).await;
    raise(Signal::SIGTERM).unwrap();

    tokio::time::sleep(Duration::from_secs(10)).await;
    panic!("second SIGTERM was swallowed");
}
