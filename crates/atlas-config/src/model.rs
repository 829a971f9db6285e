// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Atlas plugin host.
//!
//! Section structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use atlas_core::{CORE_API_VERSION, PluginConfig};
use serde::{Deserialize, Serialize};

/// Default cache directory name under the platform temp directory.
pub const DEFAULT_CACHE_DIR_NAME: &str = "atlas-plugins";

/// Top-level Atlas configuration.
///
/// Loaded from JSON files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AtlasConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Plugins to load, in order.
    #[serde(default)]
    pub plugins: Vec<PluginEntry>,

    /// Plugin cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Host version information used by the compatibility gate.
    #[serde(default)]
    pub core: CoreConfig,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            plugins: Vec::new(),
            cache: CacheConfig::default(),
            core: CoreConfig::default(),
        }
    }
}

impl AtlasConfig {
    /// Normalizes the `plugins` list into runtime configs.
    ///
    /// Bare source strings get the id `plugin_<index>`, empty settings, and
    /// are enabled.
    pub fn plugin_configs(&self) -> Vec<PluginConfig> {
        self.plugins
            .iter()
            .enumerate()
            .map(|(index, entry)| entry.to_plugin_config(index))
            .collect()
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// One element of the `plugins` array.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PluginEntry {
    /// A bare source descriptor.
    Source(String),
    /// A fully specified plugin slot.
    Detailed(PluginEntryConfig),
}

impl PluginEntry {
    /// Converts the entry into a [`PluginConfig`], using `index` for the
    /// default id of bare entries.
    pub fn to_plugin_config(&self, index: usize) -> PluginConfig {
        match self {
            PluginEntry::Source(source) => PluginConfig::new(format!("plugin_{index}"), source),
            PluginEntry::Detailed(entry) => PluginConfig::new(&entry.id, &entry.source)
                .with_settings(entry.settings.clone())
                .with_enabled(entry.enabled),
        }
    }
}

/// Object form of a `plugins` entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluginEntryConfig {
    pub id: String,
    pub source: String,
    #[serde(default)]
    pub settings: serde_json::Map<String, serde_json::Value>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Plugin cache configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Cache root. Overridden by `ATLAS_PLUGIN_CACHE_DIR`.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl CacheConfig {
    /// The configured cache root, or `<temp dir>/atlas-plugins`.
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_CACHE_DIR_NAME))
    }
}

/// Host version information.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CoreConfig {
    /// Host API version, `<major>.<minor>`.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Host core version, semver. Compared against `minCoreVersion`.
    #[serde(default = "default_core_version")]
    pub version: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            version: default_core_version(),
        }
    }
}

fn default_api_version() -> String {
    CORE_API_VERSION.to_string()
}

fn default_core_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
