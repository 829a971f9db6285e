// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Atlas configuration system.

use std::path::PathBuf;

use atlas_config::diagnostic::ConfigError;
use atlas_config::model::{AtlasConfig, DEFAULT_CACHE_DIR_NAME};
use atlas_config::{
    PluginEntry, load_and_validate_path, load_and_validate_str, load_config, load_config_from_str,
};
use figment::Jail;

/// Mixed bare-string and object entries deserialize and normalize.
#[test]
fn plugins_accept_bare_strings_and_objects() {
    let json = r#"
{
  "plugins": [
    "github:acme/widgets#v2",
    { "id": "local-tools", "source": "./plugins/tools", "settings": { "depth": 3 } },
    { "id": "off", "source": "@acme/off", "enabled": false }
  ]
}
"#;

    let config = load_config_from_str(json).expect("valid JSON should deserialize");
    assert_eq!(config.plugins.len(), 3);
    assert!(matches!(config.plugins[0], PluginEntry::Source(_)));

    let plugins = config.plugin_configs();
    assert_eq!(plugins[0].id, "plugin_0");
    assert_eq!(plugins[0].source, "github:acme/widgets#v2");
    assert!(plugins[0].enabled);
    assert!(plugins[0].settings.is_empty());

    assert_eq!(plugins[1].id, "local-tools");
    assert_eq!(plugins[1].settings["depth"], 3);
    assert!(plugins[1].enabled);

    assert_eq!(plugins[2].id, "off");
    assert!(!plugins[2].enabled);
}

/// Bare entries are numbered by their position in the list.
#[test]
fn bare_entry_ids_use_list_index() {
    let json = r#"{ "plugins": [ { "id": "named", "source": "./a" }, "./b", "./c" ] }"#;
    let plugins = load_config_from_str(json).unwrap().plugin_configs();
    let ids: Vec<&str> = plugins.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["named", "plugin_1", "plugin_2"]);
}

/// Empty document yields defaults.
#[test]
fn empty_document_uses_defaults() {
    let config = load_and_validate_str("{}").expect("defaults are valid");
    assert_eq!(config.log_level, "info");
    assert!(config.plugins.is_empty());
    assert_eq!(config.core.api_version, "1.0");
    assert!(config.cache.dir.is_none());
    assert_eq!(
        config.cache.resolved_dir(),
        std::env::temp_dir().join(DEFAULT_CACHE_DIR_NAME)
    );
}

/// Unknown top-level key produces an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_key_suggests_correction() {
    let errors = load_and_validate_str(r#"{ "plugin": [] }"#).unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "plugin");
            assert_eq!(suggestion.as_deref(), Some("plugins"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Unknown key inside a section is rejected.
#[test]
fn unknown_key_in_cache_section() {
    let err = load_config_from_str(r#"{ "cache": { "dri": "/tmp/x" } }"#)
        .expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("dri"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Semantic validation runs after deserialization.
#[test]
fn invalid_api_version_fails_validation() {
    let errors = load_and_validate_str(r#"{ "core": { "api_version": "one" } }"#).unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| e.to_string().contains("core.api_version"))
    );
}

/// `ATLAS_PLUGIN_CACHE_DIR` overrides the cache root from the file.
#[test]
fn env_overrides_cache_dir() {
    Jail::expect_with(|jail| {
        jail.create_file("atlas.json", r#"{ "cache": { "dir": "/from/file" } }"#)?;
        jail.set_env("ATLAS_PLUGIN_CACHE_DIR", "/from/env");
        jail.set_env("ATLAS_UNRELATED_SETTING", "ignored");

        let config: AtlasConfig = load_config()?;
        assert_eq!(config.cache.dir, Some(PathBuf::from("/from/env")));
        assert_eq!(config.cache.resolved_dir(), PathBuf::from("/from/env"));
        Ok(())
    });
}

/// Local `atlas.json` is picked up from the working directory.
#[test]
fn local_file_is_loaded() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "atlas.json",
            r#"{ "log_level": "debug", "core": { "api_version": "1.2" }, "plugins": ["./p"] }"#,
        )?;
        jail.set_env("ATLAS_LOG_LEVEL", "trace");

        let config = load_config()?;
        assert_eq!(config.log_level, "trace");
        assert_eq!(config.core.api_version, "1.2");
        assert_eq!(config.plugin_configs()[0].source, "./p");
        Ok(())
    });
}

/// Explicit path loading validates and reports errors.
#[test]
fn load_from_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.json");
    std::fs::write(&path, r#"{ "plugins": [ { "id": "a", "source": "" } ] }"#).unwrap();

    let errors = load_and_validate_path(&path).unwrap_err();
    assert!(errors[0].to_string().contains("plugins[0].source"));
}
