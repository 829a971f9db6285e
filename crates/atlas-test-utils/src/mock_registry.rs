// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry that records what the runtime hands it.

use std::sync::{Mutex, PoisonError};

use atlas_core::{PluginRegistry, SinkPlugin, SourcePlugin, WorkflowPlugin};

/// Captures every registration for later assertions.
#[derive(Debug, Default)]
pub struct MockRegistry {
    sources: Mutex<Vec<SourcePlugin>>,
    workflows: Mutex<Vec<WorkflowPlugin>>,
    sinks: Mutex<Vec<SinkPlugin>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sources(&self) -> Vec<SourcePlugin> {
        self.sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn workflows(&self) -> Vec<WorkflowPlugin> {
        self.workflows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn sinks(&self) -> Vec<SinkPlugin> {
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Total number of registrations of any kind.
    pub fn total(&self) -> usize {
        self.sources().len() + self.workflows().len() + self.sinks().len()
    }
}

impl PluginRegistry for MockRegistry {
    fn register_source(&self, source: SourcePlugin) {
        self.sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(source);
    }

    fn register_workflow(&self, workflow: WorkflowPlugin) {
        self.workflows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(workflow);
    }

    fn register_sink(&self, sink: SinkPlugin) {
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sink);
    }
}
