// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Module loader backed by pre-registered mock plugins.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use atlas_core::{AtlasError, ExternalPlugin, PluginManifest, PluginModuleLoader};

use crate::mock_plugin::MockPlugin;

#[derive(Clone)]
enum Behaviour {
    Plugin(MockPlugin),
    Fail(String),
    Panic(String),
}

/// Hands out a clone of the mock registered for the manifest's id.
///
/// Unknown ids fail the load. The manifest read from disk is back-filled
/// into mocks that do not declare their own.
#[derive(Default)]
pub struct StaticLoader {
    plugins: Mutex<HashMap<String, Behaviour>>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(self, manifest_id: &str, behaviour: Behaviour) -> Self {
        self.plugins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(manifest_id.to_string(), behaviour);
        self
    }

    pub fn with_plugin(self, manifest_id: &str, plugin: MockPlugin) -> Self {
        self.insert(manifest_id, Behaviour::Plugin(plugin))
    }

    /// Makes loading `manifest_id` fail with `message`.
    pub fn failing(self, manifest_id: &str, message: &str) -> Self {
        self.insert(manifest_id, Behaviour::Fail(message.to_string()))
    }

    /// Makes loading `manifest_id` panic.
    pub fn panicking(self, manifest_id: &str, message: &str) -> Self {
        self.insert(manifest_id, Behaviour::Panic(message.to_string()))
    }
}

#[async_trait]
impl PluginModuleLoader for StaticLoader {
    async fn load(
        &self,
        manifest: &PluginManifest,
        plugin_dir: &Path,
    ) -> Result<Box<dyn ExternalPlugin>, AtlasError> {
        debug!(plugin_id = %manifest.id, dir = %plugin_dir.display(), "static load");
        let behaviour = self
            .plugins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&manifest.id)
            .cloned()
            .unwrap_or_else(|| Behaviour::Fail(format!("no mock registered for {}", manifest.id)));

        match behaviour {
            Behaviour::Plugin(mut plugin) => {
                plugin.backfill_manifest(manifest);
                Ok(Box::new(plugin))
            }
            Behaviour::Fail(message) => Err(AtlasError::Internal(message)),
            Behaviour::Panic(message) => panic!("{message}"),
        }
    }
}
