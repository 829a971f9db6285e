// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle runtime tests using mock plugins and a recording registry.

use std::path::Path;
use std::sync::Arc;

use atlas_core::{Capability, HealthReport, HealthStatus, PluginConfig};
use atlas_plugin::{
    AcquireOptions, Acquirer, ErrorCode, HostVersion, LoadOutcome, PluginLoader, PluginRuntime,
};
use atlas_test_utils::{CallLog, MockPlugin, MockRegistry, StaticLoader, fixtures};
use serde_json::json;
use tempfile::TempDir;

struct Harness {
    _tmp: TempDir,
    runtime: PluginRuntime,
    registry: Arc<MockRegistry>,
}

/// Creates one local plugin directory per `(dir name, manifest id)` and a
/// runtime whose backend serves `modules`.
fn harness(plugins: &[(&str, &str)], modules: StaticLoader) -> Harness {
    let tmp = tempfile::tempdir().unwrap();
    for (name, id) in plugins {
        fixtures::plugin_dir(tmp.path(), name, &fixtures::manifest_json(id, "1.0")).unwrap();
    }
    let registry = Arc::new(MockRegistry::new());
    let runtime = PluginRuntime::new(loader(tmp.path(), modules), registry.clone());
    Harness {
        _tmp: tmp,
        runtime,
        registry,
    }
}

fn loader(base: &Path, modules: StaticLoader) -> PluginLoader {
    let options = AcquireOptions::new(base.join("cache")).with_base_dir(base);
    PluginLoader::new(
        Acquirer::new(options).unwrap(),
        Arc::new(modules),
        HostVersion::default(),
    )
}

#[tokio::test]
async fn disabled_plugin_is_skipped_entirely() {
    let log = CallLog::new();
    let modules = StaticLoader::new().with_plugin(
        "com.acme.off",
        MockPlugin::new()
            .with_call_log(log.clone())
            .with_initialize()
            .with_workflow("w"),
    );
    let mut h = harness(&[("off", "com.acme.off")], modules);

    let reports = h
        .runtime
        .load_all(&[PluginConfig::new("off", "./off").with_enabled(false)])
        .await;

    assert!(matches!(reports[0].outcome, LoadOutcome::Disabled));
    assert!(h.runtime.states().is_empty());
    assert_eq!(h.registry.total(), 0);
    assert!(log.entries().is_empty());
}

#[tokio::test]
async fn components_are_registered_in_config_order() {
    let modules = StaticLoader::new()
        .with_plugin(
            "com.acme.a",
            MockPlugin::new().with_source("feed").with_workflow("a1"),
        )
        .with_plugin(
            "com.acme.b",
            MockPlugin::new().with_workflow("b1").with_sink("out"),
        );
    let mut h = harness(&[("a", "com.acme.a"), ("b", "com.acme.b")], modules);

    let reports = h
        .runtime
        .load_all(&[PluginConfig::new("a", "./a"), PluginConfig::new("b", "./b")])
        .await;

    assert!(
        reports
            .iter()
            .all(|r| matches!(r.outcome, LoadOutcome::Loaded(_)))
    );
    let workflows: Vec<_> = h
        .registry
        .workflows()
        .iter()
        .filter_map(|w| w.name().map(str::to_string))
        .collect();
    assert_eq!(workflows, vec!["a1", "b1"]);
    assert_eq!(h.registry.sources().len(), 1);
    assert_eq!(h.registry.sinks().len(), 1);

    let ids: Vec<_> = h.runtime.states().iter().map(|s| s.id()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(h.runtime.plugin("b").unwrap().manifest.id, "com.acme.b");
    assert!(h.runtime.plugin("c").is_none());
}

#[tokio::test]
async fn failed_load_does_not_stop_later_plugins() {
    let modules = StaticLoader::new().with_plugin("com.acme.ok", MockPlugin::new().with_workflow("w"));
    let mut h = harness(&[("ok", "com.acme.ok")], modules);

    let reports = h
        .runtime
        .load_all(&[
            PluginConfig::new("missing", "./missing"),
            PluginConfig::new("ok", "./ok"),
        ])
        .await;

    match &reports[0].outcome {
        LoadOutcome::Failed(err) => assert_eq!(err.code, ErrorCode::NotFound),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(matches!(reports[1].outcome, LoadOutcome::Loaded(_)));
    assert_eq!(h.runtime.states().len(), 1);
    assert_eq!(h.registry.workflows().len(), 1);
}

#[tokio::test]
async fn initialize_failure_discards_plugin() {
    let log = CallLog::new();
    let modules = StaticLoader::new().with_plugin(
        "com.acme.p",
        MockPlugin::new()
            .with_call_log(log.clone())
            .failing_initialize("missing api token")
            .with_workflow("w"),
    );
    let mut h = harness(&[("p", "com.acme.p")], modules);

    let reports = h.runtime.load_all(&[PluginConfig::new("p", "./p")]).await;

    match &reports[0].outcome {
        LoadOutcome::Failed(err) => {
            assert_eq!(err.code, ErrorCode::InitializationError);
            assert!(err.message.contains("missing api token"));
        }
        other => panic!("expected initialization failure, got {other:?}"),
    }
    assert!(h.runtime.states().is_empty());
    assert_eq!(h.registry.total(), 0);
    assert_eq!(log.count(Capability::Initialize), 1);
}

#[tokio::test]
async fn initialize_runs_only_when_declared() {
    let log = CallLog::new();
    let modules = StaticLoader::new()
        .with_plugin(
            "com.acme.hooked",
            MockPlugin::new().with_call_log(log.clone()).with_initialize(),
        )
        .with_plugin("com.acme.plain", MockPlugin::new().with_call_log(log.clone()));
    let mut h = harness(
        &[("hooked", "com.acme.hooked"), ("plain", "com.acme.plain")],
        modules,
    );

    let settings = json!({ "depth": 2 }).as_object().unwrap().clone();
    h.runtime
        .load_all(&[
            PluginConfig::new("hooked", "./hooked").with_settings(settings),
            PluginConfig::new("plain", "./plain"),
        ])
        .await;

    assert_eq!(log.entries(), vec!["initialize com.acme.hooked"]);
    assert_eq!(h.runtime.states().len(), 2);
}

#[tokio::test]
async fn health_covers_only_declaring_plugins() {
    let modules = StaticLoader::new()
        .with_plugin(
            "com.acme.good",
            MockPlugin::new().with_health(HealthReport {
                status: HealthStatus::Degraded,
                details: Some(json!({ "lag": 3 })),
            }),
        )
        .with_plugin(
            "com.acme.bad",
            MockPlugin::new().failing_health("db down", Some(json!({ "db": "down" }))),
        )
        .with_plugin("com.acme.silent", MockPlugin::new());
    let mut h = harness(
        &[
            ("good", "com.acme.good"),
            ("bad", "com.acme.bad"),
            ("silent", "com.acme.silent"),
        ],
        modules,
    );
    h.runtime
        .load_all(&[
            PluginConfig::new("good", "./good"),
            PluginConfig::new("bad", "./bad"),
            PluginConfig::new("silent", "./silent"),
        ])
        .await;

    let health = h.runtime.health_check_all().await;

    assert_eq!(health.len(), 2);
    assert_eq!(health[0].id, "good");
    assert_eq!(health[0].status, HealthStatus::Degraded);
    assert_eq!(health[0].details, Some(json!({ "lag": 3 })));
    assert_eq!(health[1].id, "bad");
    assert_eq!(health[1].status, HealthStatus::Error);
    assert_eq!(health[1].details, Some(json!({ "db": "down" })));
}

#[tokio::test]
async fn shutdown_continues_after_a_failure() {
    let log = CallLog::new();
    let modules = StaticLoader::new()
        .with_plugin(
            "com.acme.first",
            MockPlugin::new()
                .with_call_log(log.clone())
                .failing_shutdown("socket already closed"),
        )
        .with_plugin(
            "com.acme.second",
            MockPlugin::new().with_call_log(log.clone()).with_shutdown(),
        )
        .with_plugin("com.acme.third", MockPlugin::new().with_call_log(log.clone()));
    let mut h = harness(
        &[
            ("first", "com.acme.first"),
            ("second", "com.acme.second"),
            ("third", "com.acme.third"),
        ],
        modules,
    );
    h.runtime
        .load_all(&[
            PluginConfig::new("first", "./first"),
            PluginConfig::new("second", "./second"),
            PluginConfig::new("third", "./third"),
        ])
        .await;

    h.runtime.shutdown_all().await;

    assert_eq!(
        log.entries(),
        vec!["shutdown com.acme.first", "shutdown com.acme.second"]
    );
}

#[tokio::test]
async fn panicking_hooks_are_contained_per_plugin() {
    let log = CallLog::new();
    let modules = StaticLoader::new()
        .with_plugin(
            "com.acme.boom",
            MockPlugin::new()
                .with_call_log(log.clone())
                .panicking_hook(Capability::Initialize, "init exploded"),
        )
        .with_plugin(
            "com.acme.flaky",
            MockPlugin::new()
                .with_call_log(log.clone())
                .panicking_hook(Capability::Health, "health check exploded")
                .with_shutdown(),
        )
        .with_plugin(
            "com.acme.fragile",
            MockPlugin::new()
                .with_call_log(log.clone())
                .panicking_hook(Capability::Shutdown, "stop exploded"),
        )
        .with_plugin(
            "com.acme.last",
            MockPlugin::new().with_call_log(log.clone()).with_shutdown(),
        );
    let mut h = harness(
        &[
            ("boom", "com.acme.boom"),
            ("flaky", "com.acme.flaky"),
            ("fragile", "com.acme.fragile"),
            ("last", "com.acme.last"),
        ],
        modules,
    );

    let reports = h
        .runtime
        .load_all(&[
            PluginConfig::new("boom", "./boom"),
            PluginConfig::new("flaky", "./flaky"),
            PluginConfig::new("fragile", "./fragile"),
            PluginConfig::new("last", "./last"),
        ])
        .await;

    match &reports[0].outcome {
        LoadOutcome::Failed(err) => {
            assert_eq!(err.code, ErrorCode::InitializationError);
            assert!(err.message.contains("init exploded"));
        }
        other => panic!("expected initialization failure, got {other:?}"),
    }
    assert_eq!(h.runtime.states().len(), 3);

    let health = h.runtime.health_check_all().await;
    assert_eq!(health.len(), 1);
    assert_eq!(health[0].id, "flaky");
    assert_eq!(health[0].status, HealthStatus::Error);

    h.runtime.shutdown_all().await;
    assert_eq!(log.count(Capability::Shutdown), 3);
    assert!(log.entries().contains(&"shutdown com.acme.last".to_string()));
}

#[tokio::test]
async fn empty_configuration_is_a_no_op() {
    let mut h = harness(&[], StaticLoader::new());
    assert!(h.runtime.load_all(&[]).await.is_empty());
    assert!(h.runtime.health_check_all().await.is_empty());
    h.runtime.shutdown_all().await;
}
