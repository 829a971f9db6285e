// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests running real plugin processes (`sh` scripts).

#![cfg(unix)]

use std::path::Path;
use std::sync::Arc;

use atlas_core::{HealthStatus, PluginConfig};
use atlas_plugin::{
    AcquireOptions, Acquirer, ErrorCode, HostVersion, LoadOutcome, PluginLoader, PluginRuntime,
    ProcessLoader,
};
use atlas_test_utils::MockRegistry;
use serde_json::json;

/// Answers `describe` with one workflow and no hooks.
const WORKFLOW_ONLY: &str = r#"#!/bin/sh
while IFS= read -r line; do
  case "$line" in
    *'"type":"describe"'*)
      echo '{"workflows":[{"name":"nightly-digest","steps":[]}]}' ;;
    *)
      echo '{"ok":false,"error":"unexpected message"}' ;;
  esac
done
"#;

/// Declares every hook; initialize fails when `fail_init` is set.
const FULL_LIFECYCLE: &str = r#"#!/bin/sh
while IFS= read -r line; do
  case "$line" in
    *'"type":"describe"'*)
      echo '{"capabilities":["initialize","health","shutdown"],"sources":[{"name":"rss"}],"sinks":[{"name":"mail"}]}' ;;
    *'"type":"initialize"'*'"fail_init":true'*)
      echo '{"ok":false,"error":"bad credentials","details":{"field":"token"}}' ;;
    *'"type":"initialize"'*)
      echo '{"ok":true}' ;;
    *'"type":"health"'*)
      echo '{"ok":true,"status":"degraded","details":{"queue":12}}' ;;
    *'"type":"shutdown"'*)
      echo '{"ok":true}'
      exit 0 ;;
  esac
done
"#;

fn write_plugin(root: &Path, name: &str, id: &str, script: &str) {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("plugin.sh"), script).unwrap();
    let manifest = json!({
        "id": id,
        "name": name,
        "version": "0.1.0",
        "apiVersion": "1.0",
        "entry": "plugin.sh"
    });
    std::fs::write(
        dir.join("atlas.plugin.json"),
        serde_json::to_string(&manifest).unwrap(),
    )
    .unwrap();
}

fn runtime(base: &Path, registry: Arc<MockRegistry>) -> PluginRuntime {
    let options = AcquireOptions::new(base.join("cache")).with_base_dir(base);
    let loader = PluginLoader::new(
        Acquirer::new(options).unwrap(),
        Arc::new(ProcessLoader),
        HostVersion::default(),
    );
    PluginRuntime::new(loader, registry)
}

#[tokio::test]
async fn workflow_plugin_registers_one_workflow() {
    let tmp = tempfile::tempdir().unwrap();
    write_plugin(tmp.path(), "digest", "com.acme.digest", WORKFLOW_ONLY);
    let registry = Arc::new(MockRegistry::new());
    let mut runtime = runtime(tmp.path(), registry.clone());

    let reports = runtime
        .load_all(&[PluginConfig::new("digest", "./digest")])
        .await;

    match &reports[0].outcome {
        LoadOutcome::Loaded(counts) => assert_eq!(counts.workflows, 1),
        other => panic!("expected load, got {other:?}"),
    }
    let workflows = registry.workflows();
    assert_eq!(workflows.len(), 1);
    assert_eq!(workflows[0].name(), Some("nightly-digest"));
    assert_eq!(runtime.states().len(), 1);
    assert!(runtime.health_check_all().await.is_empty());

    runtime.shutdown_all().await;
}

#[tokio::test]
async fn hooks_round_trip_over_stdio() {
    let tmp = tempfile::tempdir().unwrap();
    write_plugin(tmp.path(), "mailer", "com.acme.mailer", FULL_LIFECYCLE);
    let registry = Arc::new(MockRegistry::new());
    let mut runtime = runtime(tmp.path(), registry.clone());

    runtime
        .load_all(&[PluginConfig::new("mailer", "./mailer")])
        .await;
    assert_eq!(registry.sources().len(), 1);
    assert_eq!(registry.sinks().len(), 1);

    let health = runtime.health_check_all().await;
    assert_eq!(health.len(), 1);
    assert_eq!(health[0].status, HealthStatus::Degraded);
    assert_eq!(health[0].details, Some(json!({ "queue": 12 })));

    runtime.shutdown_all().await;
}

#[tokio::test]
async fn failed_initialize_reports_initialization_error() {
    let tmp = tempfile::tempdir().unwrap();
    write_plugin(tmp.path(), "mailer", "com.acme.mailer", FULL_LIFECYCLE);
    let registry = Arc::new(MockRegistry::new());
    let mut runtime = runtime(tmp.path(), registry.clone());

    let settings = json!({ "fail_init": true }).as_object().unwrap().clone();
    let reports = runtime
        .load_all(&[PluginConfig::new("mailer", "./mailer").with_settings(settings)])
        .await;

    match &reports[0].outcome {
        LoadOutcome::Failed(err) => {
            assert_eq!(err.code, ErrorCode::InitializationError);
            assert!(err.message.contains("bad credentials"));
        }
        other => panic!("expected initialization failure, got {other:?}"),
    }
    assert!(runtime.states().is_empty());
    assert_eq!(registry.total(), 0);
}

#[tokio::test]
async fn entry_that_exits_immediately_is_load_error() {
    let tmp = tempfile::tempdir().unwrap();
    write_plugin(tmp.path(), "dead", "com.acme.dead", "#!/bin/sh\nexit 0\n");
    let registry = Arc::new(MockRegistry::new());
    let mut runtime = runtime(tmp.path(), registry);

    let reports = runtime.load_all(&[PluginConfig::new("dead", "./dead")]).await;
    match &reports[0].outcome {
        LoadOutcome::Failed(err) => {
            assert_eq!(err.code, ErrorCode::LoadError);
            assert!(err.message.contains("com.acme.dead"));
        }
        other => panic!("expected load error, got {other:?}"),
    }
}
