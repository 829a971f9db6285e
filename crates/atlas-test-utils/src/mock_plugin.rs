// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory plugin with scripted hook behaviour.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use atlas_core::{
    AtlasError, Capabilities, Capability, ExternalPlugin, HealthReport, PluginConfig,
    PluginManifest, SinkPlugin, SourcePlugin, WorkflowPlugin,
};

use crate::fixtures;

/// Shared, ordered record of hook invocations, e.g. `"initialize com.acme.a"`.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, hook: Capability, plugin: &str) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{hook} {plugin}"));
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of recorded calls to `hook`.
    pub fn count(&self, hook: Capability) -> usize {
        let prefix = format!("{hook} ");
        self.entries()
            .iter()
            .filter(|entry| entry.starts_with(&prefix))
            .count()
    }
}

/// A plugin whose hooks succeed or fail as configured.
///
/// Hooks are only declared as capabilities when configured with one of the
/// `with_*` builders, mirroring how real plugins opt in.
#[derive(Debug, Clone)]
pub struct MockPlugin {
    manifest: PluginManifest,
    declares_manifest: bool,
    capabilities: Capabilities,
    sources: Vec<SourcePlugin>,
    workflows: Vec<WorkflowPlugin>,
    sinks: Vec<SinkPlugin>,
    initialize_error: Option<String>,
    shutdown_error: Option<String>,
    health: Result<HealthReport, (String, Option<Value>)>,
    panics_in: Option<(Capability, String)>,
    calls: CallLog,
}

impl Default for MockPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlugin {
    /// A plugin with no components and no hooks.
    pub fn new() -> Self {
        Self {
            manifest: fixtures::manifest("com.example.mock", "1.0"),
            declares_manifest: false,
            capabilities: Capabilities::none(),
            sources: Vec::new(),
            workflows: Vec::new(),
            sinks: Vec::new(),
            initialize_error: None,
            shutdown_error: None,
            health: Ok(HealthReport::healthy()),
            panics_in: None,
            calls: CallLog::new(),
        }
    }

    /// Declares the plugin's own manifest, which a loader must not replace.
    pub fn with_manifest(mut self, manifest: PluginManifest) -> Self {
        self.manifest = manifest;
        self.declares_manifest = true;
        self
    }

    /// Uses `manifest` unless the plugin declared its own.
    pub fn backfill_manifest(&mut self, manifest: &PluginManifest) {
        if !self.declares_manifest {
            self.manifest = manifest.clone();
        }
    }

    pub fn with_call_log(mut self, calls: CallLog) -> Self {
        self.calls = calls;
        self
    }

    pub fn with_source(mut self, name: &str) -> Self {
        self.sources.push(SourcePlugin(serde_json::json!({ "name": name })));
        self
    }

    pub fn with_workflow(mut self, name: &str) -> Self {
        self.workflows
            .push(WorkflowPlugin(serde_json::json!({ "name": name })));
        self
    }

    pub fn with_sink(mut self, name: &str) -> Self {
        self.sinks.push(SinkPlugin(serde_json::json!({ "name": name })));
        self
    }

    /// Declares an initialize hook that succeeds.
    pub fn with_initialize(mut self) -> Self {
        self.capabilities.insert(Capability::Initialize);
        self
    }

    /// Declares an initialize hook that fails with `message`.
    pub fn failing_initialize(mut self, message: &str) -> Self {
        self.capabilities.insert(Capability::Initialize);
        self.initialize_error = Some(message.to_string());
        self
    }

    pub fn with_shutdown(mut self) -> Self {
        self.capabilities.insert(Capability::Shutdown);
        self
    }

    pub fn failing_shutdown(mut self, message: &str) -> Self {
        self.capabilities.insert(Capability::Shutdown);
        self.shutdown_error = Some(message.to_string());
        self
    }

    /// Declares a health hook returning `report`.
    pub fn with_health(mut self, report: HealthReport) -> Self {
        self.capabilities.insert(Capability::Health);
        self.health = Ok(report);
        self
    }

    /// Declares a health hook that fails with `message` and optional details.
    pub fn failing_health(mut self, message: &str, details: Option<Value>) -> Self {
        self.capabilities.insert(Capability::Health);
        self.health = Err((message.to_string(), details));
        self
    }

    /// Declares `hook` and makes it panic with `message` when called.
    pub fn panicking_hook(mut self, hook: Capability, message: &str) -> Self {
        self.capabilities.insert(hook);
        self.panics_in = Some((hook, message.to_string()));
        self
    }

    pub fn calls(&self) -> &CallLog {
        &self.calls
    }

    /// Records the call and panics if `hook` was scripted to.
    fn enter(&self, hook: Capability) {
        self.calls.record(hook, &self.manifest.id);
        if let Some((panicking, message)) = &self.panics_in {
            if *panicking == hook {
                panic!("{message}");
            }
        }
    }

    fn hook_error(&self, hook: Capability, message: &str, details: Option<Value>) -> AtlasError {
        AtlasError::Hook {
            plugin: self.manifest.id.clone(),
            hook,
            message: message.to_string(),
            details,
        }
    }
}

#[async_trait]
impl ExternalPlugin for MockPlugin {
    fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn sources(&self) -> &[SourcePlugin] {
        &self.sources
    }

    fn workflows(&self) -> &[WorkflowPlugin] {
        &self.workflows
    }

    fn sinks(&self) -> &[SinkPlugin] {
        &self.sinks
    }

    async fn initialize(&self, _config: &PluginConfig) -> Result<(), AtlasError> {
        self.enter(Capability::Initialize);
        match &self.initialize_error {
            Some(message) => Err(self.hook_error(Capability::Initialize, message, None)),
            None => Ok(()),
        }
    }

    async fn shutdown(&self) -> Result<(), AtlasError> {
        self.enter(Capability::Shutdown);
        match &self.shutdown_error {
            Some(message) => Err(self.hook_error(Capability::Shutdown, message, None)),
            None => Ok(()),
        }
    }

    async fn health(&self) -> Result<HealthReport, AtlasError> {
        self.enter(Capability::Health);
        match &self.health {
            Ok(report) => Ok(report.clone()),
            Err((message, details)) => {
                Err(self.hook_error(Capability::Health, message, details.clone()))
            }
        }
    }
}
