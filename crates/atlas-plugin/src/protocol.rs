// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSONL messages exchanged with process plugins.
//!
//! The host writes one [`HostMessage`] per line to the plugin's stdin and
//! reads exactly one reply line from its stdout. `describe` is answered
//! with a [`DescribeReply`]; every hook is answered with a [`HookReply`].

use atlas_core::{
    Capabilities, HealthStatus, PluginConfig, PluginManifest, SinkPlugin, SourcePlugin,
    WorkflowPlugin,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    /// Ask the plugin what it provides.
    Describe,
    Initialize { config: PluginConfig },
    Health,
    Shutdown,
}

/// What a plugin provides, sent once after spawn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescribeReply {
    /// The plugin's own manifest. Takes precedence over the one on disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PluginManifest>,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub sources: Vec<SourcePlugin>,
    #[serde(default)]
    pub workflows: Vec<WorkflowPlugin>,
    #[serde(default)]
    pub sinks: Vec<SinkPlugin>,
}

/// Reply to a lifecycle hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookReply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Only meaningful for health replies. Defaults to healthy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<HealthStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
