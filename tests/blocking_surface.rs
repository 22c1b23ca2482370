//! The blocking start/stop surfaces behave exactly like the async ones.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use lifecycle_host::{Host, LifecycleState};

mod common;

use common::{host_with, EventLog, RecordingApp, Recorder};

fn build(log: &EventLog) -> (Host, Arc<AtomicUsize>) {
    host_with(log, RecordingApp::new(log), |registry| {
        registry
            .add_lifecycle_participant(Recorder::new("a", log))
            .add_hosted_service(Recorder::new("b", log));
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_spawned_and_blocking_starts_match() {
    let spawned_log = EventLog::default();
    let (spawned, _) = build(&spawned_log);
    spawned
        .spawn(CancellationToken::new())
        .unwrap()
        .join()
        .await
        .unwrap();
    spawned.stop(CancellationToken::new()).await.unwrap();

    let blocking_log = EventLog::default();
    let (blocking, _) = build(&blocking_log);
    let handle = blocking.clone();
    tokio::task::spawn_blocking(move || {
        handle.start_blocking(CancellationToken::new())?;
        handle.stop_blocking(CancellationToken::new())
    })
    .await
    .unwrap()
    .unwrap();

    assert!(!spawned_log.events().is_empty());
    assert_eq!(spawned_log.events(), blocking_log.events());
    assert_eq!(spawned.state(), blocking.state());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_block_in_place_from_worker() {
    let log = EventLog::default();
    let (host, disposals) = build(&log);

    host.start_blocking(CancellationToken::new()).unwrap();
    assert_eq!(host.state(), LifecycleState::Running);

    host.dispose_blocking().unwrap();
    assert_eq!(host.state(), LifecycleState::Stopped);
    assert_eq!(disposals.load(Ordering::SeqCst), 1);
    assert!(log.events().contains(&"a:post_stop-end".to_string()));
}

#[test]
fn test_entered_runtime_drives_blocking_calls() {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let _guard = rt.enter();

    let log = EventLog::default();
    let (host, _) = build(&log);

    host.start_blocking(CancellationToken::new()).unwrap();
    host.stop_application().unwrap();

    // A second request is a no-op.
    host.stop_application().unwrap();
    assert!(host.application_stopped().is_signaled());
    assert_eq!(
        log.filtered("gate:"),
        vec![
            "gate:ApplicationStarted".to_string(),
            "gate:ApplicationStopping".to_string(),
            "gate:ApplicationStopped".to_string(),
        ]
    );
}

