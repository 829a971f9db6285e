// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin manifest data model (`atlas.plugin.json`).
//!
//! Parsing and validation live in `atlas-plugin`; this module only defines
//! the typed shape that validation produces and plugins report back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::Display;

/// File name of the manifest at the root of an acquired plugin.
pub const MANIFEST_FILE_NAME: &str = "atlas.plugin.json";

/// `major.minor` plugin API version implemented by this host.
pub const CORE_API_VERSION: &str = "1.0";

/// Identity and contract metadata of a plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginManifest {
    /// Unique identifier, reverse-DNS recommended (`com.acme.widgets`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Semantic version of the plugin itself.
    pub version: String,
    /// Host API version the plugin targets, `<major>.<minor>`.
    pub api_version: String,
    /// Entry point, relative to the plugin root.
    pub entry: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Component names the plugin declares it exports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<ManifestExports>,
    /// Settings schema for the plugin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ManifestConfig>,
    /// Declared dependencies, name to version range. Not installed by the host.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
    /// Minimum host core version, semver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_core_version: Option<String>,
}

impl PluginManifest {
    /// Settings schema fields, if the manifest declares a `config` section.
    pub fn settings_schema(&self) -> Option<&BTreeMap<String, ConfigSchema>> {
        self.config.as_ref().map(|c| &c.schema)
    }
}

/// Names of the components a plugin declares in its manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestExports {
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub workflows: Vec<String>,
    #[serde(default)]
    pub sinks: Vec<String>,
}

/// The `config` section of a manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestConfig {
    #[serde(default)]
    pub schema: BTreeMap<String, ConfigSchema>,
}

/// Value type of a settings field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

/// Recursive schema for one settings field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSchema {
    #[serde(rename = "type")]
    pub kind: SchemaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub required: bool,
    /// Secret values are never logged.
    #[serde(default)]
    pub secret: bool,
    /// Element schema for arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ConfigSchema>>,
    /// Field schemas for objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, ConfigSchema>>,
}
