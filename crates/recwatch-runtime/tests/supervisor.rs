//! Lifecycle tests driving a real shell worker.

use std::sync::Arc;
use std::time::Duration;

use recwatch_core::{ConfigStore, WorkerEvent, WorkerState};
use recwatch_runtime::process::WorkerCommand;
use recwatch_runtime::{EventBus, ProcessError, Supervisor};
use tempfile::TempDir;
use tokio::sync::broadcast;
use tokio::time::{sleep, timeout};

const EVENT_WAIT: Duration = Duration::from_secs(5);

fn shell_worker(script: &str) -> WorkerCommand {
    WorkerCommand::new("sh", ".").with_args(["-c", script])
}

fn supervisor_for(script: &str) -> (TempDir, Arc<Supervisor>) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(ConfigStore::new(dir.path().join("config")).unwrap());
    let sup = Arc::new(Supervisor::new(
        shell_worker(script),
        Duration::from_secs(2),
        store,
        EventBus::default(),
    ));
    (dir, sup)
}

async fn next_event(rx: &mut broadcast::Receiver<WorkerEvent>) -> WorkerEvent {
    timeout(EVENT_WAIT, rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("bus closed")
}

/// Wait until `status()` reports `want`, within the event-wait bound.
async fn settle(sup: &Arc<Supervisor>, want: WorkerState) {
    let deadline = tokio::time::Instant::now() + EVENT_WAIT;
    loop {
        if sup.status() == want {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "state never settled into {want:?} (currently {:?})",
            sup.status()
        );
        sleep(Duration::from_millis(25)).await;
    }
}

#[tokio::test]
async fn start_then_stop_settles_cleanly() {
    let (_dir, sup) = supervisor_for("echo recording; sleep 30");
    let (initial, mut rx) = sup.subscribe();
    assert_eq!(initial, WorkerEvent::status(false));

    sup.start().await.unwrap();
    assert_eq!(sup.status(), WorkerState::Running);

    // First two events of a start: status true, then the started line
    assert_eq!(next_event(&mut rx).await, WorkerEvent::status(true));
    match next_event(&mut rx).await {
        WorkerEvent::Log { text, .. } => assert!(text.starts_with("recorder started (PID ")),
        other => panic!("unexpected event: {other:?}"),
    }

    // At least one line of worker output is captured
    loop {
        match next_event(&mut rx).await {
            WorkerEvent::Log { text, .. } if text == "recording" => break,
            WorkerEvent::Log { .. } => {}
            other => panic!("unexpected event: {other:?}"),
        }
    }

    sup.stop().await.unwrap();
    assert_eq!(sup.status(), WorkerState::Stopped);
    assert_eq!(next_event(&mut rx).await, WorkerEvent::status(false));
    match next_event(&mut rx).await {
        WorkerEvent::Log { text, .. } => assert_eq!(text, "recorder stopped"),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn subscribing_while_running_snapshots_running_state() {
    let (_dir, sup) = supervisor_for("sleep 30");
    sup.start().await.unwrap();

    // A viewer connecting mid-run must see the live state first
    let (initial, _rx) = sup.subscribe();
    assert_eq!(initial, WorkerEvent::status(true));

    sup.stop().await.unwrap();
    let (initial, _rx) = sup.subscribe();
    assert_eq!(initial, WorkerEvent::status(false));
}

#[tokio::test]
async fn start_when_running_is_a_noop() {
    let (_dir, sup) = supervisor_for("sleep 30");
    sup.start().await.unwrap();
    let (_, mut rx) = sup.subscribe();

    // Second start succeeds without spawning (no events published)
    sup.start().await.unwrap();
    assert_eq!(sup.status(), WorkerState::Running);
    assert!(
        timeout(Duration::from_millis(300), rx.recv()).await.is_err(),
        "no-op start must not publish events"
    );

    sup.stop().await.unwrap();
}

#[tokio::test]
async fn stop_when_stopped_is_a_noop() {
    let (_dir, sup) = supervisor_for("sleep 30");
    let (_, mut rx) = sup.subscribe();

    sup.stop().await.unwrap();
    assert_eq!(sup.status(), WorkerState::Stopped);
    assert!(
        timeout(Duration::from_millis(300), rx.recv()).await.is_err(),
        "no-op stop must not publish events"
    );
}

#[tokio::test]
async fn unexpected_exit_is_reported_once() {
    let (_dir, sup) = supervisor_for("echo bye");
    let (_, mut rx) = sup.subscribe();

    sup.start().await.unwrap();
    settle(&sup, WorkerState::Stopped).await;

    // Exactly one crash log and one status {false} were published
    let mut crash_logs = 0;
    let mut status_false = 0;
    loop {
        match timeout(Duration::from_millis(500), rx.recv()).await {
            Ok(Ok(WorkerEvent::Log { text, .. })) => {
                if text.starts_with("recorder exited unexpectedly") {
                    crash_logs += 1;
                }
            }
            Ok(Ok(WorkerEvent::Status { is_running })) => {
                if !is_running {
                    status_false += 1;
                }
            }
            _ => break,
        }
    }
    assert_eq!(crash_logs, 1);
    assert_eq!(status_false, 1);

    // Supervisor remains usable after a crash
    sup.stop().await.unwrap();
    assert_eq!(sup.status(), WorkerState::Stopped);
}

#[tokio::test]
async fn restart_publishes_exact_event_sequence() {
    let (_dir, sup) = supervisor_for("sleep 30");
    sup.start().await.unwrap();

    let (_, mut rx) = sup.subscribe();
    sup.restart().await.unwrap();
    assert_eq!(sup.status(), WorkerState::Running);

    match next_event(&mut rx).await {
        WorkerEvent::Log { text, .. } => assert_eq!(text, "restarting recorder"),
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(next_event(&mut rx).await, WorkerEvent::status(false));
    assert_eq!(next_event(&mut rx).await, WorkerEvent::status(true));
    match next_event(&mut rx).await {
        WorkerEvent::Log { text, .. } => assert_eq!(text, "recorder restarted"),
        other => panic!("unexpected event: {other:?}"),
    }

    sup.stop().await.unwrap();
}

#[tokio::test]
async fn config_change_while_running_triggers_one_restart() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(ConfigStore::new(dir.path().join("config")).unwrap());
    let sup = Arc::new(Supervisor::new(
        shell_worker("sleep 30"),
        Duration::from_secs(2),
        Arc::clone(&store),
        EventBus::default(),
    ));
    let _watcher = sup.watch_config_changes();

    sup.start().await.unwrap();
    let (_, mut rx) = sup.subscribe();

    store.write(&recwatch_core::ConfigBundle::default()).unwrap();

    // Exactly one full restart sequence comes through
    match next_event(&mut rx).await {
        WorkerEvent::Log { text, .. } => assert_eq!(text, "restarting recorder"),
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(next_event(&mut rx).await, WorkerEvent::status(false));
    assert_eq!(next_event(&mut rx).await, WorkerEvent::status(true));
    match next_event(&mut rx).await {
        WorkerEvent::Log { text, .. } => assert_eq!(text, "recorder restarted"),
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(
        timeout(Duration::from_millis(500), rx.recv()).await.is_err(),
        "a single write must trigger a single restart"
    );

    sup.stop().await.unwrap();
}

#[tokio::test]
async fn config_change_while_stopped_does_not_restart() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(ConfigStore::new(dir.path().join("config")).unwrap());
    let sup = Arc::new(Supervisor::new(
        shell_worker("sleep 30"),
        Duration::from_secs(2),
        Arc::clone(&store),
        EventBus::default(),
    ));
    let _watcher = sup.watch_config_changes();
    let (_, mut rx) = sup.subscribe();

    store.write(&recwatch_core::ConfigBundle::default()).unwrap();

    assert!(
        timeout(Duration::from_millis(500), rx.recv()).await.is_err(),
        "config change while stopped must not touch the worker"
    );
    assert_eq!(sup.status(), WorkerState::Stopped);
}

#[tokio::test]
async fn restarted_worker_sees_updated_configuration() {
    let dir = TempDir::new().unwrap();
    let config_dir = dir.path().join("config");
    let store = Arc::new(ConfigStore::new(&config_dir).unwrap());

    // Worker echoes its URL config, then idles: the restart picks up the
    // freshly-written file
    let script = "cat config/URL_config.ini 2>/dev/null; sleep 30";
    let sup = Arc::new(Supervisor::new(
        WorkerCommand::new("sh", dir.path()).with_args(["-c", script]),
        Duration::from_secs(2),
        Arc::clone(&store),
        EventBus::default(),
    ));
    let _watcher = sup.watch_config_changes();

    sup.start().await.unwrap();
    let (_, mut rx) = sup.subscribe();

    let mut bundle = recwatch_core::ConfigBundle::default();
    bundle.url_config.content = "https://live.example.com/room/42\n".to_string();
    store.write(&bundle).unwrap();

    let seen = loop {
        match next_event(&mut rx).await {
            WorkerEvent::Log { text, .. } if text.contains("room/42") => break text,
            _ => {}
        }
    };
    assert!(seen.contains("https://live.example.com/room/42"));

    sup.stop().await.unwrap();
}

#[tokio::test]
async fn sigterm_ignorer_still_resolves_to_stopped() {
    let (_dir, sup_slow) = {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(ConfigStore::new(dir.path().join("config")).unwrap());
        let sup = Arc::new(Supervisor::new(
            shell_worker("trap '' TERM; sleep 30"),
            Duration::from_millis(500),
            store,
            EventBus::default(),
        ));
        (dir, sup)
    };

    sup_slow.start().await.unwrap();
    // Let the shell install its trap before stopping
    sleep(Duration::from_millis(300)).await;
    let (_, mut rx) = sup_slow.subscribe();

    sup_slow.stop().await.unwrap();
    assert_eq!(sup_slow.status(), WorkerState::Stopped);

    // The escalation was logged before the stop completed
    let mut saw_escalation = false;
    loop {
        match timeout(Duration::from_millis(500), rx.recv()).await {
            Ok(Ok(WorkerEvent::Log { text, .. })) => {
                if text.contains("killed") {
                    saw_escalation = true;
                }
            }
            Ok(Ok(WorkerEvent::Status { .. })) => {}
            _ => break,
        }
    }
    assert!(saw_escalation);
}

#[tokio::test]
async fn commands_reject_busy_while_stop_is_in_flight() {
    let (_dir, sup) = supervisor_for("trap '' TERM; sleep 30");
    sup.start().await.unwrap();
    sleep(Duration::from_millis(300)).await;

    // Stop takes the full grace period because the worker ignores SIGTERM
    let stopper = {
        let sup = Arc::clone(&sup);
        tokio::spawn(async move { sup.stop().await })
    };
    sleep(Duration::from_millis(200)).await;

    // Status stays readable while the stop is in flight
    assert_eq!(sup.status(), WorkerState::Stopping);
    assert!(matches!(sup.start().await, Err(ProcessError::Busy)));
    assert!(matches!(sup.restart().await, Err(ProcessError::Busy)));

    stopper.await.unwrap().unwrap();
    assert_eq!(sup.status(), WorkerState::Stopped);
}
