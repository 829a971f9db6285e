// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host-side registry that receives plugin components.

use crate::types::{SinkPlugin, SourcePlugin, WorkflowPlugin};

/// Registry owned by the execution engine.
///
/// Registration is fire-and-forget: the runtime hands every component over
/// and observes no result. Implementations use interior mutability.
pub trait PluginRegistry: Send + Sync {
    fn register_source(&self, source: SourcePlugin);

    fn register_workflow(&self, workflow: WorkflowPlugin);

    fn register_sink(&self, sink: SinkPlugin);
}
