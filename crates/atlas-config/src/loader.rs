// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./atlas.json` > `~/.config/atlas/atlas.json` > `/etc/atlas/atlas.json`
//! with environment variable overrides via the `ATLAS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};

use crate::model::AtlasConfig;

/// Environment variables recognised after the `ATLAS_` prefix is stripped.
const ENV_KEYS: &[&str] = &[
    "log_level",
    "plugin_cache_dir",
    "cache_dir",
    "core_version",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/atlas/atlas.json` (system-wide)
/// 3. `~/.config/atlas/atlas.json` (user XDG config)
/// 4. `./atlas.json` (local directory)
/// 5. `ATLAS_*` environment variables
pub fn load_config() -> Result<AtlasConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a JSON string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(json_content: &str) -> Result<AtlasConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AtlasConfig::default()))
        .merge(Json::string(json_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AtlasConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AtlasConfig::default()))
        .merge(Json::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(AtlasConfig::default()))
        .merge(Json::file("/etc/atlas/atlas.json"))
        .merge(Json::file(
            dirs::config_dir()
                .map(|d| d.join("atlas/atlas.json"))
                .unwrap_or_default(),
        ))
        .merge(Json::file("atlas.json"))
        .merge(env_provider())
}

/// Create the environment variable provider.
///
/// Only known keys are picked up so unrelated `ATLAS_*` variables do not trip
/// `deny_unknown_fields`. `ATLAS_PLUGIN_CACHE_DIR` is the documented cache
/// root override and maps to `cache.dir`.
fn env_provider() -> Env {
    Env::prefixed("ATLAS_")
        .filter(|key| ENV_KEYS.iter().any(|k| key.as_str().eq_ignore_ascii_case(k)))
        .map(|key| {
            let key_str = key.as_str().to_ascii_lowercase();
            let mapped = match key_str.as_str() {
                "plugin_cache_dir" => "cache.dir".to_string(),
                other => other
                    .replacen("cache_", "cache.", 1)
                    .replacen("core_", "core.", 1),
            };
            mapped.into()
        })
}
