// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend that turns a validated plugin directory into a live plugin.

use std::path::Path;

use async_trait::async_trait;

use crate::error::AtlasError;
use crate::manifest::PluginManifest;
use crate::traits::plugin::ExternalPlugin;

/// Loads the entry point named by a validated manifest.
///
/// The manifest has already passed validation and the API compatibility
/// gate when this is called, and `manifest.entry` exists under `plugin_dir`.
/// Implementations back-fill the returned plugin's manifest with `manifest`
/// when the plugin does not declare its own.
#[async_trait]
pub trait PluginModuleLoader: Send + Sync {
    async fn load(
        &self,
        manifest: &PluginManifest,
        plugin_dir: &Path,
    ) -> Result<Box<dyn ExternalPlugin>, AtlasError>;
}
