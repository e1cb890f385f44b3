// tests/scope_resolution.rs

use watchrunner::errors::WatchrunnerError;
use watchrunner::plugin::Registry;
use watchrunner::scope::{self, Scope, ScopeRequest};
use watchrunner_test_utils::{CallLog, RegistryBuilder};

fn registry() -> Registry {
    RegistryBuilder::new(CallLog::default())
        .group("backend", false)
        .group("frontend", false)
        .plugin("rspec", "backend", &["**/*.rb"])
        .plugin("rubocop", "backend", &["**/*.rb"])
        .plugin("sass", "frontend", &["**/*.scss"])
        .plugin("readme", "default", &["*.md"])
        .build()
}

#[test]
fn empty_request_resolves_to_everything() {
    let mut registry = registry();
    let scope = scope::resolve(&mut registry, &ScopeRequest::default()).unwrap();

    assert!(scope.is_empty());
    assert_eq!(scope, Scope::all());

    let names: Vec<String> = registry
        .scoped(&scope)
        .into_iter()
        .flat_map(|(_, plugins)| plugins)
        .collect();
    assert_eq!(names, vec!["readme", "rspec", "rubocop", "sass"]);
}

#[test]
fn unknown_plugin_is_an_error() {
    let mut registry = registry();
    let err = scope::resolve(&mut registry, &ScopeRequest::plugins(["nope"])).unwrap_err();
    assert!(matches!(err, WatchrunnerError::UnknownPlugin(ref name) if name == "nope"));
}

#[test]
fn failed_resolution_creates_no_groups() {
    let mut registry = registry();
    let request = ScopeRequest {
        groups: vec!["docs".into()],
        plugins: vec!["nope".into()],
    };

    let err = scope::resolve(&mut registry, &request).unwrap_err();

    assert!(matches!(err, WatchrunnerError::UnknownPlugin(_)));
    assert!(registry.group("docs").is_none());
}

#[test]
fn unknown_group_is_created_on_demand() {
    let mut registry = registry();
    assert!(registry.group("docs").is_none());

    let scope = scope::resolve(&mut registry, &ScopeRequest::groups(["docs"])).unwrap();

    assert_eq!(scope.groups(), ["docs".to_string()]);
    assert!(registry.group("docs").is_some());
    // A new, empty group selects no plugins.
    assert!(registry.scoped(&scope).is_empty());
}

#[test]
fn duplicates_are_dropped_in_request_order() {
    let mut registry = registry();
    let request = ScopeRequest {
        groups: vec!["frontend".into(), "backend".into(), "frontend".into()],
        plugins: vec!["sass".into(), "rspec".into(), "sass".into()],
    };
    let scope = scope::resolve(&mut registry, &request).unwrap();

    assert_eq!(scope.groups(), ["frontend".to_string(), "backend".to_string()]);
    assert_eq!(scope.plugins(), ["sass".to_string(), "rspec".to_string()]);
}

#[test]
fn plugins_in_a_scope_win_over_groups() {
    let mut registry = registry();
    let request = ScopeRequest {
        groups: vec!["frontend".into()],
        plugins: vec!["rubocop".into()],
    };
    let scope = scope::resolve(&mut registry, &request).unwrap();

    assert_eq!(
        registry.scoped(&scope),
        vec![("backend".to_string(), vec!["rubocop".to_string()])]
    );
}

#[test]
fn groups_select_their_plugins_in_group_order() {
    let mut registry = registry();
    let scope =
        scope::resolve(&mut registry, &ScopeRequest::groups(["frontend", "backend"])).unwrap();

    assert_eq!(
        registry.scoped(&scope),
        vec![
            (
                "backend".to_string(),
                vec!["rspec".to_string(), "rubocop".to_string()]
            ),
            ("frontend".to_string(), vec!["sass".to_string()]),
        ]
    );
}

#[test]
fn unrestricted_scope_falls_back() {
    let mut registry = registry();
    let current = scope::resolve(&mut registry, &ScopeRequest::groups(["backend"])).unwrap();
    let requested = scope::resolve(&mut registry, &ScopeRequest::plugins(["sass"])).unwrap();

    assert_eq!(Scope::all().or(&current), &current);
    assert_eq!(requested.or(&current), &requested);
}
