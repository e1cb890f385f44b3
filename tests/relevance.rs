// tests/relevance.rs

use std::path::PathBuf;
use std::sync::Arc;

use watchrunner::engine::{ChangeBatch, ChangeQueue, Context};
use watchrunner::watch::{
    handle_batch, is_relevant, ConfigFilePatterns, PatternSpec, RelevanceIndex, WatchPatterns,
};
use watchrunner_test_utils::init_tracing;

fn patterns(watch: &[&str], watch_regex: &[&str], exclude: &[&str]) -> WatchPatterns {
    let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    WatchPatterns::compile(&PatternSpec {
        watch: owned(watch),
        watch_regex: owned(watch_regex),
        exclude: owned(exclude),
    })
    .unwrap()
}

fn index() -> RelevanceIndex {
    RelevanceIndex::new(
        vec![
            ("rspec".to_string(), patterns(&["**/*.rb"], &[], &["tmp/**"])),
            ("sass".to_string(), patterns(&[], &[r"^styles/.+\.scss$"], &[])),
        ],
        ConfigFilePatterns::from_names(&["Watchrunner.toml"]),
    )
}

#[test]
fn config_file_alone_is_relevant() {
    let index = RelevanceIndex::new(vec![], ConfigFilePatterns::from_names(&["Watchrunner.toml"]));
    assert!(index.is_relevant(&ChangeBatch::modified(["Watchrunner.toml"])));
}

#[test]
fn removed_config_file_is_not_a_config_change() {
    let index = RelevanceIndex::new(vec![], ConfigFilePatterns::from_names(&["Watchrunner.toml"]));
    let batch = ChangeBatch::new(vec![], vec![], vec![PathBuf::from("Watchrunner.toml")]);
    assert!(!index.is_relevant(&batch));
}

#[test]
fn batch_matching_no_plugin_is_dropped() {
    assert!(!index().is_relevant(&ChangeBatch::modified(["README.md", "styles/app.css"])));
}

#[test]
fn globs_and_regexes_both_count() {
    let index = index();
    assert!(index.is_relevant(&ChangeBatch::modified(["lib/foo.rb"])));
    assert!(index.is_relevant(&ChangeBatch::new(
        vec![],
        vec![PathBuf::from("styles/app.scss")],
        vec![],
    )));
}

#[test]
fn exclude_wins_over_watch() {
    assert!(!index().is_relevant(&ChangeBatch::modified(["tmp/cache/foo.rb"])));
}

#[test]
fn free_function_checks_only_the_given_plugins() {
    let rb = patterns(&["**/*.rb"], &[], &[]);
    let css = patterns(&["**/*.css"], &[], &[]);
    let batch = ChangeBatch::modified(["lib/foo.rb"]);
    let no_config = ConfigFilePatterns::default();

    assert!(is_relevant(&batch, [&rb, &css], &no_config));
    assert!(!is_relevant(&batch, [&css], &no_config));
    assert!(!is_relevant(&batch, std::iter::empty(), &no_config));
}

#[test]
fn config_file_patterns_follow_the_watch_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let config = root.join("Watchrunner.toml");
    std::fs::write(&config, "").unwrap();

    let inside = ConfigFilePatterns::for_config_file(&config, &[root.clone()]);
    assert!(inside.matches(std::path::Path::new("Watchrunner.toml")));
    assert!(!inside.matches(std::path::Path::new("other.toml")));

    let sub = root.join("sub");
    std::fs::create_dir(&sub).unwrap();
    let outside = ConfigFilePatterns::for_config_file(&config, &[sub]);
    assert!(!outside.matches(std::path::Path::new("Watchrunner.toml")));
}

#[test]
fn handle_batch_normalizes_filters_and_enqueues() {
    init_tracing();
    let ctx = Context::new(
        Arc::new(ChangeQueue::default()),
        vec![PathBuf::from("/project")],
    );
    ctx.index.store(index());

    handle_batch(&ctx, ChangeBatch::modified(["/project/README.md"]));
    assert!(ctx.queue.is_empty());

    handle_batch(&ctx, ChangeBatch::modified(["/project/lib/foo.rb"]));
    let drained = ctx.queue.drain_all();
    assert_eq!(drained.changes.modified, vec![PathBuf::from("lib/foo.rb")]);
}

#[test]
fn handle_batch_reads_the_latest_published_index() {
    let ctx = Context::new(
        Arc::new(ChangeQueue::default()),
        vec![PathBuf::from("/project")],
    );

    // Nothing published yet: every batch is irrelevant.
    handle_batch(&ctx, ChangeBatch::modified(["/project/lib/foo.rb"]));
    assert!(ctx.queue.is_empty());

    ctx.index.store(index());
    handle_batch(&ctx, ChangeBatch::modified(["/project/lib/foo.rb"]));
    assert_eq!(ctx.queue.len(), 1);

    assert_eq!(
        ctx.queue.drain_all().changes,
        ChangeBatch::modified(["lib/foo.rb"])
    );
}
