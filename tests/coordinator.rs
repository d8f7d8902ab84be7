use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use lifevisor::{
    AliveSignal, Coordinator, CoordinatorConfig, DrainOutcome, EventKind, Phase, RuntimeError,
    ShutdownReason, Task, TaskError, TaskFn,
};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

fn coordinator() -> Arc<Coordinator> {
    Coordinator::builder(CoordinatorConfig::default())
        .with_signals(false)
        .build()
}

#[tokio::test]
async fn one_failure_is_the_aggregate_result() {
    let coord = coordinator();
    let stopped = Arc::new(AtomicUsize::new(0));

    for _ in 0..8 {
        let stopped = Arc::clone(&stopped);
        coord.run(move |alive| async move {
            alive.cancelled().await;
            stopped.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    }
    coord.run(|_alive| async { Err(TaskError::fail("E")) });

    assert_eq!(coord.wait().await, Err(TaskError::fail("E")));
    assert_eq!(stopped.load(Ordering::SeqCst), 8);
    assert_eq!(coord.outstanding(), 0);

    let (alive, _) = coord.alive();
    assert_eq!(alive.reason(), Some(ShutdownReason::TaskFailed));
}

#[tokio::test]
async fn clean_completion_keeps_alive_active() {
    let coord = coordinator();
    for i in 0..4u64 {
        coord.run(move |_alive| async move {
            tokio::time::sleep(Duration::from_millis(i)).await;
            Ok(())
        });
    }

    assert_eq!(coord.wait().await, Ok(()));
    let (alive, cancel) = coord.alive();
    assert!(!alive.is_cancelled());
    assert_eq!(coord.phase(), Phase::Running);

    cancel.cancel();
    assert!(alive.is_cancelled());
    assert_eq!(coord.phase(), Phase::ShuttingDown);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cancel_fires_once() {
    let coord = coordinator();
    let mut events = coord.subscribe();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let (_alive, cancel) = coord.alive();
        handles.push(tokio::spawn(async move {
            for _ in 0..10 {
                cancel.cancel();
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let (alive, _) = coord.alive();
    assert!(alive.is_cancelled());
    assert_eq!(alive.reason(), Some(ShutdownReason::Manual));

    let ev = events.recv().await.unwrap();
    assert_eq!(ev.kind, EventKind::ShutdownRequested);
    assert!(events.try_recv().is_err(), "shutdown must be published once");
}

#[tokio::test(start_paused = true)]
async fn after_alive_is_immediate_when_nothing_is_outstanding() {
    let coord = coordinator();
    coord.run(|alive| async move {
        alive.cancelled().await;
        Ok(())
    });
    let (_alive, cancel) = coord.alive();
    cancel.cancel();
    coord.wait().await.unwrap();

    let start = Instant::now();
    let drain = coord.after_alive(Duration::from_secs(600));
    drain.wait().await.unwrap();

    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(drain.outcome(), Some(DrainOutcome::Drained));
    assert_eq!(coord.phase(), Phase::Drained);
}

#[tokio::test(start_paused = true)]
async fn after_alive_times_out_on_a_stuck_task() {
    let coord = coordinator();
    let mut events = coord.subscribe();
    coord.run_named("stuck", |_alive| async {
        std::future::pending::<()>().await;
        Ok(())
    });

    let (_alive, cancel) = coord.alive();
    let drain = coord.after_alive(Duration::from_millis(250));
    let start = Instant::now();
    cancel.cancel();

    let err = drain.wait().await.unwrap_err();
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(250), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(260), "{elapsed:?}");

    assert_eq!(
        err,
        RuntimeError::ShutdownTimeout {
            timeout: Duration::from_millis(250),
            outstanding: 1
        }
    );
    assert!(matches!(
        drain.outcome(),
        Some(DrainOutcome::AbortedOnTimeout { outstanding: 1, .. })
    ));
    assert_eq!(coord.phase(), Phase::AbortedOnTimeout);

    let mut kinds = Vec::new();
    while let Ok(ev) = events.try_recv() {
        kinds.push(ev.kind);
    }
    assert_eq!(
        kinds,
        vec![
            EventKind::TaskStarting,
            EventKind::ShutdownRequested,
            EventKind::GraceExceeded
        ]
    );
}

#[tokio::test]
async fn rendezvous_scenario() {
    let coord = coordinator();
    let (to_b, from_a) = oneshot::channel::<()>();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<&'static str>();

    let done = done_tx.clone();
    coord.run(move |_alive| async move {
        let _ = to_b.send(());
        let _ = done.send("A");
        Ok(())
    });

    let done = done_tx.clone();
    coord.run(move |_alive| async move {
        from_a.await.map_err(TaskError::fail)?;
        let _ = done.send("B");
        Ok(())
    });

    let (release_c, c_gate) = oneshot::channel::<()>();
    coord.run(move |_alive| async move {
        let _ = c_gate.await;
        Err(TaskError::fail("C"))
    });

    assert_eq!(done_rx.recv().await, Some("A"));
    assert_eq!(done_rx.recv().await, Some("B"));

    let (alive, _) = coord.alive();
    assert!(!alive.is_cancelled());
    release_c.send(()).unwrap();
    alive.cancelled().await;

    assert_eq!(coord.wait().await, Err(TaskError::fail("C")));
    assert_eq!(coord.outstanding(), 0);
}

#[tokio::test(start_paused = true)]
async fn zero_tasks_drain_right_after_cancel() {
    let coord = coordinator();
    let (_alive, cancel) = coord.alive();
    cancel.cancel();

    let start = Instant::now();
    coord
        .after_alive(Duration::from_millis(100))
        .wait()
        .await
        .unwrap();
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn drain_uses_configured_grace() {
    let cfg = CoordinatorConfig {
        grace: Duration::from_secs(2),
        listen_signals: false,
        ..CoordinatorConfig::default()
    };
    let coord = Coordinator::builder(cfg).build();
    coord.run(|alive| async move {
        alive.cancelled().await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(())
    });

    let (_alive, cancel) = coord.alive();
    cancel.cancel();
    let err = coord.drain().await.unwrap_err();
    assert_eq!(err.as_label(), "runtime_shutdown_timeout");
}

struct Poller {
    polls: Arc<AtomicUsize>,
}

#[async_trait]
impl Task for Poller {
    fn name(&self) -> &str {
        "poller"
    }

    async fn run(&self, alive: AliveSignal) -> Result<(), TaskError> {
        while !alive.is_cancelled() {
            self.polls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        Ok(())
    }
}

#[tokio::test]
async fn named_tasks_show_up_in_events() {
    let coord = coordinator();
    let mut events = coord.subscribe();
    let polls = Arc::new(AtomicUsize::new(0));

    coord.run_task(Arc::new(Poller {
        polls: Arc::clone(&polls),
    }));
    coord.run_task(TaskFn::arc("broken", |_alive: AliveSignal| async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Err(TaskError::fatal("lost connection"))
    }));

    let err = coord.wait().await.unwrap_err();
    assert_eq!(err, TaskError::fatal("lost connection"));
    assert!(polls.load(Ordering::SeqCst) > 0);

    let mut failed = None;
    while let Ok(ev) = events.try_recv() {
        if ev.kind == EventKind::TaskFailed {
            failed = Some(ev);
        }
    }
    let failed = failed.expect("TaskFailed event");
    assert_eq!(failed.task.as_deref(), Some("broken"));
    assert_eq!(failed.task_seq, Some(2));
}
