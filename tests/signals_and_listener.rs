// tests/signals_and_listener.rs

use std::collections::HashSet;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use watchrunner::engine::{ChangeBatch, ChangeQueue, ControlAction, SignalRouter};
use watchrunner::errors::WatchrunnerError;
use watchrunner::types::PauseMode;
use watchrunner::watch::{Listener, NotifyListener, WatchOptions};
use watchrunner_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[cfg(unix)]
fn raise(signal: &str) -> TestResult {
    let status = std::process::Command::new("kill")
        .arg(format!("-{signal}"))
        .arg(std::process::id().to_string())
        .status()?;
    assert!(status.success());
    Ok(())
}

/// Signals are process-wide, so every signal is exercised in one test.
#[cfg(unix)]
#[tokio::test]
async fn signals_become_control_actions() -> TestResult {
    init_tracing();
    let queue = Arc::new(ChangeQueue::default());
    let router = SignalRouter::install(Arc::clone(&queue));
    assert_eq!(router.len(), 3);

    for (signal, expected) in [
        ("USR1", ControlAction::Pause(Some(PauseMode::Paused))),
        ("USR2", ControlAction::Pause(Some(PauseMode::Unpaused))),
        // No shell attached: the interrupt is turned into a queued stop.
        ("INT", ControlAction::Stop),
    ] {
        raise(signal)?;
        with_timeout(queue.wait_pending()).await;
        let drained = queue.drain_all();
        assert_eq!(drained.actions, vec![expected]);
    }
    Ok(())
}

#[tokio::test]
async fn missing_watch_dir_is_rejected() {
    let options = WatchOptions {
        dirs: vec!["/definitely/not/here".into()],
        ..WatchOptions::default()
    };
    let err = NotifyListener::new(options, Arc::new(|_: ChangeBatch| {})).unwrap_err();
    assert!(matches!(err, WatchrunnerError::WatchDir(_)));
}

#[tokio::test]
async fn listener_delivers_absolute_paths_in_bursts() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let (tx, mut rx) = mpsc::unbounded_channel::<ChangeBatch>();

    let options = WatchOptions {
        dirs: vec![dir.path().to_path_buf()],
        wait_for_delay: Duration::from_millis(50),
        ignore: vec!["*.tmp".to_string()],
        ..WatchOptions::default()
    };
    let mut listener = NotifyListener::new(
        options,
        Arc::new(move |batch: ChangeBatch| {
            let _ = tx.send(batch);
        }),
    )?;
    let root = listener.dirs()[0].clone();
    assert!(root.is_absolute());

    listener.start()?;
    assert!(listener.is_running());

    std::fs::write(root.join("scratch.tmp"), "ignored")?;
    std::fs::write(root.join("user.rb"), "class User; end")?;

    let batch = with_timeout(async {
        loop {
            match rx.recv().await {
                Some(batch) if batch.paths().any(|p| p.ends_with("user.rb")) => break batch,
                Some(_) => continue,
                None => panic!("listener closed its channel"),
            }
        }
    })
    .await;

    assert!(batch.paths().all(|p| p.is_absolute()));
    assert!(!batch.paths().any(|p| p.ends_with("scratch.tmp")));

    listener.stop()?;
    assert!(!listener.is_running());
    Ok(())
}

#[tokio::test]
async fn large_burst_reports_each_path_once_per_batch() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let (tx, mut rx) = mpsc::unbounded_channel::<ChangeBatch>();

    let options = WatchOptions {
        dirs: vec![dir.path().to_path_buf()],
        wait_for_delay: Duration::from_millis(100),
        ..WatchOptions::default()
    };
    let mut listener = NotifyListener::new(
        options,
        Arc::new(move |batch: ChangeBatch| {
            let _ = tx.send(batch);
        }),
    )?;
    let root = listener.dirs()[0].clone();
    listener.start()?;

    let expected: HashSet<_> = (0..500).map(|i| root.join(format!("file_{i}.rb"))).collect();
    for path in &expected {
        std::fs::write(path, "first")?;
        std::fs::write(path, "second")?;
    }

    let mut seen = HashSet::new();
    with_timeout(async {
        while !expected.is_subset(&seen) {
            let Some(batch) = rx.recv().await else {
                panic!("listener closed its channel");
            };
            let paths: Vec<PathBuf> = batch.paths().map(Path::to_path_buf).collect();
            let unique: HashSet<_> = paths.iter().cloned().collect();
            assert_eq!(unique.len(), paths.len(), "a path was reported twice in one batch");
            seen.extend(unique);
        }
    })
    .await;

    listener.stop()?;
    Ok(())
}
