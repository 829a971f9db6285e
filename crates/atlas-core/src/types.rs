// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the loader, the runtime, and plugin backends.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::Display;

/// Externally supplied configuration for one plugin slot.
///
/// Immutable input to a load cycle. Settings are passed through to the
/// plugin's `initialize` hook untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Host-side identifier of the slot.
    pub id: String,
    /// Source descriptor (`github:owner/repo`, `./path`, URL, or npm name).
    pub source: String,
    /// Plugin-specific settings.
    #[serde(default)]
    pub settings: serde_json::Map<String, serde_json::Value>,
    /// Disabled slots are skipped without acquisition.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl PluginConfig {
    /// Creates an enabled config with empty settings.
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            settings: serde_json::Map::new(),
            enabled: true,
        }
    }

    /// Replaces the settings map.
    pub fn with_settings(mut self, settings: serde_json::Map<String, serde_json::Value>) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A data-source component exposed by a plugin.
///
/// The shape is owned by the execution engine; the host only forwards it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourcePlugin(pub serde_json::Value);

/// A workflow component exposed by a plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowPlugin(pub serde_json::Value);

/// An output-sink component exposed by a plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SinkPlugin(pub serde_json::Value);

impl SourcePlugin {
    /// The component's `name` field, if it has one.
    pub fn name(&self) -> Option<&str> {
        component_name(&self.0)
    }
}

impl WorkflowPlugin {
    /// The component's `name` field, if it has one.
    pub fn name(&self) -> Option<&str> {
        component_name(&self.0)
    }
}

impl SinkPlugin {
    /// The component's `name` field, if it has one.
    pub fn name(&self) -> Option<&str> {
        component_name(&self.0)
    }
}

fn component_name(value: &serde_json::Value) -> Option<&str> {
    value.get("name").and_then(serde_json::Value::as_str)
}

/// Number of components a plugin exposes, per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentCounts {
    pub sources: usize,
    pub workflows: usize,
    pub sinks: usize,
}

impl ComponentCounts {
    /// Sum over all component kinds.
    pub fn total(&self) -> usize {
        self.sources + self.workflows + self.sinks
    }
}

/// Optional lifecycle hooks a plugin may implement.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    Initialize,
    Shutdown,
    Health,
}

/// The set of hooks a plugin declares.
///
/// The runtime consults this set instead of probing for hook presence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(BTreeSet<Capability>);

impl Capabilities {
    /// A plugin with no hooks.
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns true if the hook is declared.
    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    /// Declares an additional hook.
    pub fn insert(&mut self, capability: Capability) {
        self.0.insert(capability);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Health status reported by a plugin's health hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HealthStatus {
    /// Fully operational.
    Healthy,
    /// Operational but experiencing issues.
    Degraded,
    /// Not operational.
    Unhealthy,
    /// The health check itself failed.
    Error,
}

/// Result of a single health hook invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl HealthReport {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            details: None,
        }
    }

    /// Synthetic report for a health hook that failed.
    pub fn error(details: serde_json::Value) -> Self {
        Self {
            status: HealthStatus::Error,
            details: Some(details),
        }
    }
}
