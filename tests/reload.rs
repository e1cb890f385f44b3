// tests/reload.rs

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use watchrunner::engine::{ChangeBatch, ChangeQueue, Context, Coordinator, CoordinatorOptions};
use watchrunner::errors::WatchrunnerError;
use watchrunner::notifier::NotificationKind;
use watchrunner::scope::ScopeRequest;
use watchrunner::watch::{handle_batch, ConfigFilePatterns};
use watchrunner_test_utils::{
    init_tracing, Call, CallLog, FakeListener, NotifierHandle, RecordingNotifier, RegistryBuilder,
    SourceHandle, StaticConfigSource,
};

type TestResult = Result<(), Box<dyn Error>>;

fn coordinator(log: &CallLog, initial_scope: ScopeRequest) -> (Coordinator, SourceHandle, NotifierHandle) {
    let builder = RegistryBuilder::new(log.clone())
        .group("backend", false)
        .plugin("rspec", "backend", &["**/*.rb"])
        .plugin("sass", "frontend", &["**/*.scss"]);
    let (source, source_handle) = StaticConfigSource::new(move || builder.build());
    let (listener, _) = FakeListener::new();
    let (notifier, notifier_handle) = RecordingNotifier::new();
    let ctx = Context::new(
        Arc::new(ChangeQueue::default()),
        vec![PathBuf::from("/project")],
    );

    let coordinator = Coordinator::new(
        ctx,
        Box::new(source),
        Box::new(listener),
        Box::new(notifier),
        CoordinatorOptions {
            notify: true,
            initial_scope,
        },
    )
    .with_config_files(ConfigFilePatterns::from_names(&["Watchrunner.toml"]));
    (coordinator, source_handle, notifier_handle)
}

fn calls(log: &CallLog) -> Vec<(String, &'static str)> {
    log.lock()
        .unwrap()
        .iter()
        .map(|Call { plugin, hook, .. }| (plugin.clone(), *hook))
        .collect()
}

fn clear(log: &CallLog) {
    log.lock().unwrap().clear();
}

#[tokio::test]
async fn empty_scope_reevaluates_the_configuration() -> TestResult {
    init_tracing();
    let log = CallLog::default();
    let (mut coordinator, source, notifier) = coordinator(&log, ScopeRequest::default());
    coordinator.start().await?;
    assert_eq!(source.evaluations(), 1);
    clear(&log);

    coordinator.reload(&ScopeRequest::default()).await?;

    assert_eq!(source.evaluations(), 2);
    assert_eq!(
        calls(&log),
        vec![
            ("rspec".to_string(), "stop"),
            ("sass".to_string(), "stop"),
            ("rspec".to_string(), "start"),
            ("sass".to_string(), "start"),
        ]
    );
    assert!(notifier.sent().iter().any(|n| n.kind == NotificationKind::Success
        && n.message == "Configuration has been re-evaluated"));
    Ok(())
}

#[tokio::test]
async fn scoped_reload_only_reloads_that_scope() -> TestResult {
    let log = CallLog::default();
    let (mut coordinator, source, _) = coordinator(&log, ScopeRequest::default());
    coordinator.start().await?;
    clear(&log);

    coordinator.reload(&ScopeRequest::groups(["backend"])).await?;

    assert_eq!(source.evaluations(), 1);
    assert_eq!(calls(&log), vec![("rspec".to_string(), "reload")]);
    Ok(())
}

#[tokio::test]
async fn reload_of_unknown_plugin_fails_without_side_effects() -> TestResult {
    let log = CallLog::default();
    let (mut coordinator, source, _) = coordinator(&log, ScopeRequest::default());
    coordinator.start().await?;
    clear(&log);

    let err = coordinator
        .reload(&ScopeRequest::plugins(["ghost"]))
        .await
        .unwrap_err();

    assert!(matches!(err, WatchrunnerError::UnknownPlugin(_)));
    assert_eq!(source.evaluations(), 1);
    assert!(calls(&log).is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_reevaluation_keeps_running_plugins() -> TestResult {
    init_tracing();
    let log = CallLog::default();
    let (mut coordinator, source, notifier) = coordinator(&log, ScopeRequest::default());
    coordinator.start().await?;
    clear(&log);

    source.set_failing(true);
    coordinator.reload(&ScopeRequest::default()).await?;

    assert_eq!(source.evaluations(), 2);
    assert!(calls(&log).is_empty());
    assert!(coordinator.registry().plugin("rspec").is_some());
    assert!(notifier
        .sent()
        .iter()
        .any(|n| n.kind == NotificationKind::Failed));
    Ok(())
}

#[tokio::test]
async fn modified_config_file_reevaluates_before_forwarding() -> TestResult {
    let log = CallLog::default();
    let (mut coordinator, source, _) = coordinator(&log, ScopeRequest::default());
    coordinator.start().await?;
    clear(&log);

    coordinator
        .run_on_changes(&ChangeBatch::modified(["Watchrunner.toml", "app/user.rb"]))
        .await;

    assert_eq!(source.evaluations(), 2);
    let calls = calls(&log);
    assert_eq!(calls.last(), Some(&("rspec".to_string(), "run_on_modifications")));
    assert!(calls.contains(&("rspec".to_string(), "start")));
    Ok(())
}

#[tokio::test]
async fn added_config_file_does_not_reevaluate() -> TestResult {
    let log = CallLog::default();
    let (mut coordinator, source, _) = coordinator(&log, ScopeRequest::default());
    coordinator.start().await?;

    let batch = ChangeBatch::new(vec![], vec![PathBuf::from("Watchrunner.toml")], vec![]);
    coordinator.run_on_changes(&batch).await;

    assert_eq!(source.evaluations(), 1);
    Ok(())
}

#[tokio::test]
async fn run_all_without_scope_uses_the_current_scope() -> TestResult {
    let log = CallLog::default();
    let (mut coordinator, _, _) = coordinator(&log, ScopeRequest::groups(["frontend"]));
    coordinator.start().await?;
    assert_eq!(calls(&log), vec![("sass".to_string(), "start")]);
    clear(&log);

    coordinator.run_all(&ScopeRequest::default()).await?;
    assert_eq!(calls(&log), vec![("sass".to_string(), "run_all")]);
    clear(&log);

    coordinator.run_all(&ScopeRequest::plugins(["rspec"])).await?;
    assert_eq!(calls(&log), vec![("rspec".to_string(), "run_all")]);
    Ok(())
}

#[tokio::test]
async fn current_scope_survives_reevaluation() -> TestResult {
    let log = CallLog::default();
    let (mut coordinator, _, _) = coordinator(&log, ScopeRequest::plugins(["rspec"]));
    coordinator.start().await?;

    coordinator.reload(&ScopeRequest::default()).await?;

    let current = coordinator.context().current_scope();
    assert_eq!(current.plugins(), ["rspec".to_string()]);
    Ok(())
}

#[tokio::test]
async fn lifecycle_hooks_stay_inside_the_current_scope() -> TestResult {
    let log = CallLog::default();
    let (mut coordinator, _, _) = coordinator(&log, ScopeRequest::plugins(["rspec"]));

    coordinator.start().await?;
    assert_eq!(calls(&log), vec![("rspec".to_string(), "start")]);
    clear(&log);

    coordinator.reload(&ScopeRequest::default()).await?;
    assert_eq!(
        calls(&log),
        vec![("rspec".to_string(), "stop"), ("rspec".to_string(), "start")]
    );
    clear(&log);

    coordinator.stop().await?;
    assert_eq!(calls(&log), vec![("rspec".to_string(), "stop")]);
    Ok(())
}

#[tokio::test]
async fn out_of_scope_changes_never_reach_the_queue() -> TestResult {
    let log = CallLog::default();
    let (mut coordinator, _, _) = coordinator(&log, ScopeRequest::plugins(["rspec"]));
    coordinator.start().await?;
    let ctx = coordinator.context().clone();

    handle_batch(&ctx, ChangeBatch::modified(["/project/app/site.scss"]));
    assert!(!ctx.queue.has_pending());

    handle_batch(&ctx, ChangeBatch::modified(["/project/app/user.rb"]));
    assert!(ctx.queue.has_pending());
    ctx.queue.drain_all();

    // The config file stays relevant whatever the scope.
    handle_batch(&ctx, ChangeBatch::modified(["/project/Watchrunner.toml"]));
    assert!(ctx.queue.has_pending());
    Ok(())
}

#[tokio::test]
async fn changing_the_scope_republishes_the_index() -> TestResult {
    let log = CallLog::default();
    let (mut coordinator, _, _) = coordinator(&log, ScopeRequest::plugins(["rspec"]));
    coordinator.start().await?;
    clear(&log);

    coordinator.set_scope(&ScopeRequest::groups(["frontend"]))?;

    let index = coordinator.context().index.load();
    let names: Vec<&str> = index.plugin_names().collect();
    assert_eq!(names, vec!["sass"]);
    assert_eq!(coordinator.context().current_scope().groups(), ["frontend".to_string()]);
    assert!(calls(&log).is_empty());

    let err = coordinator
        .set_scope(&ScopeRequest::plugins(["ghost"]))
        .unwrap_err();
    assert!(matches!(err, WatchrunnerError::UnknownPlugin(_)));
    assert_eq!(coordinator.context().current_scope().groups(), ["frontend".to_string()]);
    Ok(())
}
