// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The loaded-plugin contract.

use async_trait::async_trait;

use crate::error::AtlasError;
use crate::manifest::PluginManifest;
use crate::types::{
    Capabilities, Capability, ComponentCounts, HealthReport, PluginConfig, SinkPlugin,
    SourcePlugin, WorkflowPlugin,
};

/// A plugin produced by a successful load.
///
/// Hooks are only invoked when the matching [`Capability`] is declared in
/// [`capabilities`](ExternalPlugin::capabilities). The default hook
/// implementations report [`AtlasError::Unsupported`].
#[async_trait]
pub trait ExternalPlugin: Send + Sync {
    /// The plugin's manifest. Read-only for the plugin's lifetime.
    fn manifest(&self) -> &PluginManifest;

    /// Hooks this plugin implements.
    fn capabilities(&self) -> &Capabilities;

    fn sources(&self) -> &[SourcePlugin];

    fn workflows(&self) -> &[WorkflowPlugin];

    fn sinks(&self) -> &[SinkPlugin];

    /// Component counts derived from the exposed arrays.
    fn components(&self) -> ComponentCounts {
        ComponentCounts {
            sources: self.sources().len(),
            workflows: self.workflows().len(),
            sinks: self.sinks().len(),
        }
    }

    /// Called once after load, before any component is registered.
    async fn initialize(&self, _config: &PluginConfig) -> Result<(), AtlasError> {
        Err(self.unsupported(Capability::Initialize))
    }

    /// Called at host shutdown.
    async fn shutdown(&self) -> Result<(), AtlasError> {
        Err(self.unsupported(Capability::Shutdown))
    }

    /// Called on demand to report plugin health.
    async fn health(&self) -> Result<HealthReport, AtlasError> {
        Err(self.unsupported(Capability::Health))
    }

    #[doc(hidden)]
    fn unsupported(&self, hook: Capability) -> AtlasError {
        AtlasError::Unsupported {
            plugin: self.manifest().id.clone(),
            hook,
        }
    }
}
