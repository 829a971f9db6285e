// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle runtime: load, initialize, register, health, shutdown.
//!
//! Plugins are processed strictly in configuration order, one at a time.
//! A failing plugin never stops the others. Only plugins that loaded and
//! initialized successfully are retained.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use atlas_core::{
    AtlasError, Capability, ComponentCounts, ExternalPlugin, HealthReport, HealthStatus, PluginConfig,
    PluginManifest, PluginRegistry,
};

use crate::error::{PluginLoadError, panic_message};
use crate::loader::{PluginLoadResult, PluginLoader};
use crate::settings::{check_settings, redact_secrets};

/// A plugin retained by the runtime.
pub struct PluginRuntimeState {
    pub config: PluginConfig,
    pub plugin: Box<dyn ExternalPlugin>,
    pub manifest: PluginManifest,
    pub components: ComponentCounts,
    pub directory: PathBuf,
}

impl PluginRuntimeState {
    pub fn id(&self) -> &str {
        &self.config.id
    }
}

impl std::fmt::Debug for PluginRuntimeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRuntimeState")
            .field("id", &self.config.id)
            .field("manifest", &self.manifest.id)
            .field("components", &self.components)
            .finish_non_exhaustive()
    }
}

/// What happened to one configured plugin during [`PluginRuntime::load_all`].
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(ComponentCounts),
    /// `enabled: false` in configuration.
    Disabled,
    Failed(PluginLoadError),
}

#[derive(Debug)]
pub struct LoadReport {
    pub id: String,
    pub source: String,
    pub outcome: LoadOutcome,
}

/// One entry of [`PluginRuntime::health_check_all`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginHealth {
    pub id: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Owns the loaded plugins and drives their lifecycle.
pub struct PluginRuntime {
    loader: PluginLoader,
    registry: Arc<dyn PluginRegistry>,
    states: Vec<PluginRuntimeState>,
}

impl PluginRuntime {
    pub fn new(loader: PluginLoader, registry: Arc<dyn PluginRegistry>) -> Self {
        Self {
            loader,
            registry,
            states: Vec::new(),
        }
    }

    pub fn loader(&self) -> &PluginLoader {
        &self.loader
    }

    /// Loads, initializes, and registers every enabled plugin in order.
    ///
    /// Returns one report per configured plugin, disabled ones included.
    pub async fn load_all(&mut self, configs: &[PluginConfig]) -> Vec<LoadReport> {
        let mut reports = Vec::with_capacity(configs.len());

        for config in configs {
            let outcome = if !config.enabled {
                debug!(plugin_id = %config.id, "plugin disabled, skipping");
                LoadOutcome::Disabled
            } else {
                match self.load_one(config).await {
                    Ok(state) => {
                        let components = state.components;
                        self.states.push(state);
                        LoadOutcome::Loaded(components)
                    }
                    Err(err) => {
                        error!(
                            plugin_id = %config.id,
                            source = %config.source,
                            code = %err.code,
                            error = %err.message,
                            "plugin not loaded"
                        );
                        LoadOutcome::Failed(err)
                    }
                }
            };

            reports.push(LoadReport {
                id: config.id.clone(),
                source: config.source.clone(),
                outcome,
            });
        }

        info!(
            configured = configs.len(),
            loaded = self.states.len(),
            "plugin loading complete"
        );
        reports
    }

    async fn load_one(&self, config: &PluginConfig) -> Result<PluginRuntimeState, PluginLoadError> {
        let loaded = match self.loader.load_plugin(&config.source).await {
            PluginLoadResult::Loaded(loaded) => loaded,
            PluginLoadResult::Failed(failed) => return Err(failed.error),
        };

        if let Some(schema) = loaded.manifest.settings_schema() {
            for issue in check_settings(schema, &config.settings) {
                warn!(
                    plugin_id = %config.id,
                    setting = %issue.path,
                    problem = %issue.message,
                    "plugin setting does not match config schema"
                );
            }
            debug!(
                plugin_id = %config.id,
                settings = %serde_json::Value::Object(redact_secrets(schema, &config.settings)),
                "plugin settings"
            );
        }

        let plugin = loaded.plugin;
        if plugin.capabilities().contains(Capability::Initialize) {
            debug!(plugin_id = %config.id, "initializing plugin");
            guarded(&config.id, Capability::Initialize, plugin.initialize(config))
                .await
                .map_err(PluginLoadError::initialization)?;
        }

        for source in plugin.sources() {
            self.registry.register_source(source.clone());
        }
        for workflow in plugin.workflows() {
            self.registry.register_workflow(workflow.clone());
        }
        for sink in plugin.sinks() {
            self.registry.register_sink(sink.clone());
        }

        info!(
            plugin_id = %config.id,
            manifest_id = %loaded.manifest.id,
            sources = loaded.components.sources,
            workflows = loaded.components.workflows,
            sinks = loaded.components.sinks,
            "plugin registered"
        );

        Ok(PluginRuntimeState {
            config: config.clone(),
            plugin,
            manifest: loaded.manifest,
            components: loaded.components,
            directory: loaded.directory,
        })
    }

    /// Polls every retained plugin that implements the health hook.
    ///
    /// A failing hook becomes an entry with status `error`.
    pub async fn health_check_all(&self) -> Vec<PluginHealth> {
        let mut results = Vec::new();
        for state in &self.states {
            if !state.plugin.capabilities().contains(Capability::Health) {
                continue;
            }

            let outcome = guarded(state.id(), Capability::Health, state.plugin.health()).await;
            let report = match outcome {
                Ok(report) => report,
                Err(err) => {
                    warn!(plugin_id = %state.id(), error = %err, "plugin health check failed");
                    HealthReport::error(err.details())
                }
            };
            results.push(PluginHealth {
                id: state.id().to_string(),
                status: report.status,
                details: report.details,
            });
        }
        results
    }

    /// Calls the shutdown hook of every retained plugin that implements it.
    ///
    /// Failures are logged; every plugin gets its turn.
    pub async fn shutdown_all(&self) {
        for state in &self.states {
            if !state.plugin.capabilities().contains(Capability::Shutdown) {
                continue;
            }
            match guarded(state.id(), Capability::Shutdown, state.plugin.shutdown()).await {
                Ok(()) => debug!(plugin_id = %state.id(), "plugin shut down"),
                Err(err) => error!(plugin_id = %state.id(), error = %err, "plugin shutdown failed"),
            }
        }
        info!(count = self.states.len(), "plugin shutdown complete");
    }

    /// Retained plugins in load order.
    pub fn states(&self) -> &[PluginRuntimeState] {
        &self.states
    }

    /// Looks up a retained plugin by configuration id.
    pub fn plugin(&self, id: &str) -> Option<&PluginRuntimeState> {
        self.states.iter().find(|state| state.id() == id)
    }
}

/// Awaits one hook call, reporting a panic as a failure of that hook.
async fn guarded<T>(
    plugin_id: &str,
    hook: Capability,
    call: impl Future<Output = Result<T, AtlasError>>,
) -> Result<T, AtlasError> {
    AssertUnwindSafe(call).catch_unwind().await.unwrap_or_else(|panic| {
        Err(AtlasError::Hook {
            plugin: plugin_id.to_string(),
            hook,
            message: format!("panicked: {}", panic_message(panic.as_ref())),
            details: None,
        })
    })
}
