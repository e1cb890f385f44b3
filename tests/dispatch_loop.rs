// tests/dispatch_loop.rs

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use watchrunner::engine::{
    ChangeBatch, ChangeQueue, Context, ControlAction, Coordinator, CoordinatorOptions,
    DispatchLoop, DispatchState,
};
use watchrunner::scope::ScopeRequest;
use watchrunner::types::{PauseMode, PauseState};
use watchrunner::watch::handle_batch;
use watchrunner_test_utils::{
    init_tracing, with_timeout, Call, CallLog, FakeListener, ListenerHandle, RecordingNotifier,
    RegistryBuilder, StaticConfigSource,
};

type TestResult = Result<(), Box<dyn Error>>;

/// PluginA watches Ruby files, PluginB stylesheets.
fn dispatch_loop(log: &CallLog) -> (DispatchLoop, ListenerHandle) {
    let builder = RegistryBuilder::new(log.clone())
        .plugin("PluginA", "default", &["**/*.rb"])
        .plugin("PluginB", "default", &["**/*.css"]);
    let (source, _) = StaticConfigSource::new(move || builder.build());
    let (listener, handle) = FakeListener::new();
    let (notifier, _) = RecordingNotifier::new();
    let ctx = Context::new(
        Arc::new(ChangeQueue::default()),
        vec![PathBuf::from("/project")],
    );

    let coordinator = Coordinator::new(
        ctx,
        Box::new(source),
        Box::new(listener),
        Box::new(notifier),
        CoordinatorOptions::default(),
    );
    (DispatchLoop::new(coordinator), handle)
}

fn change_calls(log: &CallLog) -> Vec<Call> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|c| c.hook.starts_with("run_on_"))
        .cloned()
        .collect()
}

#[tokio::test]
async fn batch_reaches_only_the_plugin_that_watches_it() -> TestResult {
    init_tracing();
    let log = CallLog::default();
    let (mut dispatch, _) = dispatch_loop(&log);
    dispatch.coordinator_mut().start().await?;
    let ctx = dispatch.coordinator().context().clone();

    handle_batch(&ctx, ChangeBatch::modified(["/project/lib/foo.rb"]));
    let drained = dispatch.run_cycle().await;

    assert_eq!(drained.changes.modified, vec![PathBuf::from("lib/foo.rb")]);
    assert_eq!(
        change_calls(&log),
        vec![Call {
            plugin: "PluginA".to_string(),
            hook: "run_on_modifications",
            paths: vec![PathBuf::from("lib/foo.rb")],
        }]
    );
    assert_eq!(dispatch.state(), DispatchState::Idle);
    Ok(())
}

#[tokio::test]
async fn batches_queued_before_a_pause_are_still_forwarded() -> TestResult {
    init_tracing();
    let log = CallLog::default();
    let (mut dispatch, listener) = dispatch_loop(&log);
    dispatch.coordinator_mut().start().await?;
    let queue = Arc::clone(&dispatch.coordinator().context().queue);

    queue.push(ChangeBatch::modified(["a.rb"]));
    queue.push(ControlAction::Pause(Some(PauseMode::Paused)));
    queue.push(ChangeBatch::modified(["b.rb"]));
    queue.push(ChangeBatch::modified(["c.rb"]));

    dispatch.run_cycle().await;

    assert_eq!(dispatch.coordinator().pause_state(), PauseState::Paused);
    assert!(!listener.is_running());
    assert_eq!(
        change_calls(&log),
        vec![Call {
            plugin: "PluginA".to_string(),
            hook: "run_on_modifications",
            paths: vec![
                PathBuf::from("a.rb"),
                PathBuf::from("b.rb"),
                PathBuf::from("c.rb"),
            ],
        }]
    );
    Ok(())
}

#[tokio::test]
async fn hooks_run_modifications_then_additions_then_removals() -> TestResult {
    let log = CallLog::default();
    let (mut dispatch, _) = dispatch_loop(&log);
    dispatch.coordinator_mut().start().await?;
    let queue = Arc::clone(&dispatch.coordinator().context().queue);

    queue.push(ChangeBatch::new(
        vec![PathBuf::from("site.css")],
        vec![PathBuf::from("new.rb")],
        vec![PathBuf::from("old.rb"), PathBuf::from("old.css")],
    ));
    dispatch.run_cycle().await;

    let calls: Vec<(String, &'static str, Vec<PathBuf>)> = change_calls(&log)
        .into_iter()
        .map(|c| (c.plugin, c.hook, c.paths))
        .collect();
    assert_eq!(
        calls,
        vec![
            ("PluginA".to_string(), "run_on_additions", vec![PathBuf::from("new.rb")]),
            ("PluginA".to_string(), "run_on_removals", vec![PathBuf::from("old.rb")]),
            ("PluginB".to_string(), "run_on_modifications", vec![PathBuf::from("site.css")]),
            ("PluginB".to_string(), "run_on_removals", vec![PathBuf::from("old.css")]),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn stop_ends_the_cycle_without_forwarding_changes() -> TestResult {
    let log = CallLog::default();
    let (mut dispatch, listener) = dispatch_loop(&log);
    dispatch.coordinator_mut().start().await?;
    let queue = Arc::clone(&dispatch.coordinator().context().queue);

    queue.push(ChangeBatch::modified(["a.rb"]));
    queue.push(ControlAction::Stop);
    let drained = dispatch.run_cycle().await;

    assert_eq!(drained.actions, vec![ControlAction::Stop]);
    assert!(dispatch.coordinator().is_stopped());
    assert!(change_calls(&log).is_empty());
    assert!(!listener.is_running());
    Ok(())
}

#[tokio::test]
async fn failing_action_does_not_block_the_batch() -> TestResult {
    init_tracing();
    let log = CallLog::default();
    let (mut dispatch, _) = dispatch_loop(&log);
    dispatch.coordinator_mut().start().await?;
    let queue = Arc::clone(&dispatch.coordinator().context().queue);

    queue.push(ControlAction::RunAll(ScopeRequest::plugins(["ghost"])));
    queue.push(ChangeBatch::modified(["a.css"]));
    dispatch.run_cycle().await;

    assert!(!dispatch.coordinator().is_stopped());
    assert_eq!(change_calls(&log).len(), 1);
    assert_eq!(change_calls(&log)[0].plugin, "PluginB");
    Ok(())
}

#[tokio::test]
async fn run_starts_drains_and_returns_after_stop() -> TestResult {
    init_tracing();
    let log = CallLog::default();
    let (dispatch, listener) = dispatch_loop(&log);
    let queue = Arc::clone(&dispatch.coordinator().context().queue);

    let handle = tokio::spawn(dispatch.run());
    queue.push(ChangeBatch::modified(["lib/foo.rb"]));
    queue.push(ControlAction::Stop);

    with_timeout(handle).await??;

    let hooks: Vec<(String, &'static str)> = log
        .lock()
        .unwrap()
        .iter()
        .map(|c| (c.plugin.clone(), c.hook))
        .collect();
    assert_eq!(hooks.first(), Some(&("PluginA".to_string(), "start")));
    assert_eq!(hooks.last(), Some(&("PluginB".to_string(), "stop")));
    assert_eq!(listener.starts(), 1);
    assert!(!listener.is_running());
    Ok(())
}
