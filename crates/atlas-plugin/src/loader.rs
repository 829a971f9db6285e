// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The load pipeline: parse, acquire, validate, gate, load.
//!
//! [`PluginLoader::load_plugin`] never returns `Err` and never panics out.
//! Every failure, including a panic in a plugin backend, comes back as
//! [`PluginLoadResult::Failed`] with a stable [`ErrorCode`].

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, info, warn};

use atlas_core::manifest::ManifestExports;
use atlas_core::{
    CORE_API_VERSION, ComponentCounts, ExternalPlugin, PluginManifest, PluginModuleLoader,
};

use crate::acquire::Acquirer;
use crate::error::{ErrorCode, PluginLoadError, panic_message};
use crate::manifest::{check_api_compatibility, check_core_version, read_manifest};
use crate::source;

/// Versions the compatibility gate compares plugins against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostVersion {
    /// `major.minor` API version.
    pub api_version: String,
    /// Semantic version of the host, compared with `minCoreVersion`.
    pub core_version: String,
}

impl Default for HostVersion {
    fn default() -> Self {
        Self {
            api_version: CORE_API_VERSION.to_string(),
            core_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// A plugin that made it through every stage.
pub struct LoadedPlugin {
    pub plugin: Box<dyn ExternalPlugin>,
    pub manifest: PluginManifest,
    pub components: ComponentCounts,
    /// Where the plugin was acquired to.
    pub directory: PathBuf,
}

impl std::fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("manifest", &self.manifest.id)
            .field("components", &self.components)
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}

/// A failed load. The manifest is kept when the failure happened after it
/// was validated.
#[derive(Debug)]
pub struct FailedLoad {
    pub error: PluginLoadError,
    pub manifest: Option<PluginManifest>,
}

impl FailedLoad {
    fn new(error: impl Into<PluginLoadError>) -> Self {
        Self {
            error: error.into(),
            manifest: None,
        }
    }

    fn with_manifest(error: PluginLoadError, manifest: PluginManifest) -> Self {
        Self {
            error,
            manifest: Some(manifest),
        }
    }
}

/// Outcome of [`PluginLoader::load_plugin`].
#[derive(Debug)]
pub enum PluginLoadResult {
    Loaded(LoadedPlugin),
    Failed(FailedLoad),
}

impl PluginLoadResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PluginLoadResult::Loaded(_))
    }

    pub fn error(&self) -> Option<&PluginLoadError> {
        match self {
            PluginLoadResult::Loaded(_) => None,
            PluginLoadResult::Failed(failed) => Some(&failed.error),
        }
    }

    pub fn manifest(&self) -> Option<&PluginManifest> {
        match self {
            PluginLoadResult::Loaded(loaded) => Some(&loaded.manifest),
            PluginLoadResult::Failed(failed) => failed.manifest.as_ref(),
        }
    }

    /// Component counts. All zero for a failed load.
    pub fn components(&self) -> ComponentCounts {
        match self {
            PluginLoadResult::Loaded(loaded) => loaded.components,
            PluginLoadResult::Failed(_) => ComponentCounts::default(),
        }
    }
}

/// Runs the load pipeline for one source descriptor at a time.
pub struct PluginLoader {
    acquirer: Acquirer,
    module_loader: Arc<dyn PluginModuleLoader>,
    host: HostVersion,
}

impl PluginLoader {
    pub fn new(
        acquirer: Acquirer,
        module_loader: Arc<dyn PluginModuleLoader>,
        host: HostVersion,
    ) -> Self {
        Self {
            acquirer,
            module_loader,
            host,
        }
    }

    pub fn acquirer(&self) -> &Acquirer {
        &self.acquirer
    }

    pub fn host(&self) -> &HostVersion {
        &self.host
    }

    /// Loads the plugin named by a source descriptor.
    pub async fn load_plugin(&self, source: &str) -> PluginLoadResult {
        info!(source, "loading plugin");
        let outcome = AssertUnwindSafe(self.try_load(source))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(FailedLoad::new(PluginLoadError::new(
                    ErrorCode::LoadError,
                    format!(
                        "unexpected failure while loading plugin: {}",
                        panic_message(panic.as_ref())
                    ),
                )))
            });

        match outcome {
            Ok(loaded) => {
                info!(
                    source,
                    plugin_id = %loaded.manifest.id,
                    version = %loaded.manifest.version,
                    sources = loaded.components.sources,
                    workflows = loaded.components.workflows,
                    sinks = loaded.components.sinks,
                    "plugin loaded"
                );
                PluginLoadResult::Loaded(loaded)
            }
            Err(failed) => {
                warn!(
                    source,
                    code = %failed.error.code,
                    error = %failed.error.message,
                    "plugin failed to load"
                );
                PluginLoadResult::Failed(failed)
            }
        }
    }

    async fn try_load(&self, descriptor: &str) -> Result<LoadedPlugin, FailedLoad> {
        let source = source::parse(descriptor).map_err(FailedLoad::new)?;
        let directory = self
            .acquirer
            .acquire(&source)
            .await
            .map_err(FailedLoad::new)?;
        debug!(source = %source, dir = %directory.display(), "plugin acquired");

        let manifest = read_manifest(&directory).await.map_err(FailedLoad::new)?;

        let compat = check_api_compatibility(&manifest.api_version, &self.host.api_version);
        if !compat.compatible {
            let message = compat.message.unwrap_or_default();
            return Err(FailedLoad::with_manifest(
                PluginLoadError::new(ErrorCode::ApiVersionMismatch, message),
                manifest,
            ));
        }

        if let Some(min) = &manifest.min_core_version {
            let compat = check_core_version(min, &self.host.core_version);
            if !compat.compatible {
                let message = compat.message.unwrap_or_default();
                return Err(FailedLoad::with_manifest(
                    PluginLoadError::new(ErrorCode::ApiVersionMismatch, message),
                    manifest,
                ));
            }
        }

        let entry = directory.join(&manifest.entry);
        let is_file = tokio::fs::metadata(&entry)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            let message = format!("entry point {} is not a file", entry.display());
            return Err(FailedLoad::with_manifest(
                PluginLoadError::new(ErrorCode::NotFound, message),
                manifest,
            ));
        }

        let plugin = match self.module_loader.load(&manifest, &directory).await {
            Ok(plugin) => plugin,
            Err(err) => return Err(FailedLoad::with_manifest(err.into(), manifest)),
        };

        let components = plugin.components();
        if let Some(exports) = &manifest.exports {
            warn_on_export_mismatch(&manifest.id, exports, plugin.as_ref());
        }

        Ok(LoadedPlugin {
            manifest: plugin.manifest().clone(),
            plugin,
            components,
            directory,
        })
    }
}

/// Logs components declared in the manifest's exports but not provided by
/// the loaded plugin.
fn warn_on_export_mismatch(plugin_id: &str, exports: &ManifestExports, plugin: &dyn ExternalPlugin) {
    let sources: Vec<&str> = plugin.sources().iter().filter_map(|c| c.name()).collect();
    let workflows: Vec<&str> = plugin.workflows().iter().filter_map(|c| c.name()).collect();
    let sinks: Vec<&str> = plugin.sinks().iter().filter_map(|c| c.name()).collect();

    for (kind, declared, provided) in [
        ("source", &exports.sources, &sources),
        ("workflow", &exports.workflows, &workflows),
        ("sink", &exports.sinks, &sinks),
    ] {
        for name in declared {
            if !provided.contains(&name.as_str()) {
                warn!(
                    plugin_id,
                    kind,
                    component = %name,
                    "manifest exports a component the plugin does not provide"
                );
            }
        }
    }
}
