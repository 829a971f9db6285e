// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring from validated configuration to a plugin runtime.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use atlas_config::AtlasConfig;
use atlas_core::{ComponentCounts, PluginRegistry, SinkPlugin, SourcePlugin, WorkflowPlugin};
use atlas_plugin::{
    AcquireError, AcquireOptions, Acquirer, HostVersion, PluginCache, PluginLoader,
    PluginRuntime, ProcessLoader,
};

/// Registry used by the CLI: logs each component and keeps totals.
#[derive(Debug, Default)]
pub struct LoggingRegistry {
    counts: Mutex<ComponentCounts>,
}

impl LoggingRegistry {
    pub fn counts(&self) -> ComponentCounts {
        *self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self, f: impl FnOnce(&mut ComponentCounts)) {
        f(&mut self.counts.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

impl PluginRegistry for LoggingRegistry {
    fn register_source(&self, source: SourcePlugin) {
        info!(kind = "source", name = source.name().unwrap_or("<unnamed>"), "registered component");
        self.bump(|c| c.sources += 1);
    }

    fn register_workflow(&self, workflow: WorkflowPlugin) {
        info!(kind = "workflow", name = workflow.name().unwrap_or("<unnamed>"), "registered component");
        self.bump(|c| c.workflows += 1);
    }

    fn register_sink(&self, sink: SinkPlugin) {
        info!(kind = "sink", name = sink.name().unwrap_or("<unnamed>"), "registered component");
        self.bump(|c| c.sinks += 1);
    }
}

/// Host versions taken from the `core` config section.
pub fn host_version(config: &AtlasConfig) -> HostVersion {
    HostVersion {
        api_version: config.core.api_version.clone(),
        core_version: config.core.version.clone(),
    }
}

pub fn plugin_cache(config: &AtlasConfig) -> PluginCache {
    PluginCache::new(config.cache.resolved_dir())
}

/// Builds a runtime that loads plugins as child processes.
pub fn build_runtime(
    config: &AtlasConfig,
    registry: Arc<LoggingRegistry>,
) -> Result<PluginRuntime, AcquireError> {
    let options = AcquireOptions::new(config.cache.resolved_dir());
    let loader = PluginLoader::new(
        Acquirer::new(options)?,
        Arc::new(ProcessLoader),
        host_version(config),
    );
    Ok(PluginRuntime::new(loader, registry))
}
