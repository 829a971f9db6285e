// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Atlas plugin host.
//!
//! This crate provides the trait seams, error type, and data model shared by
//! the plugin loader, the lifecycle runtime, and plugin backends. Nothing in
//! here performs I/O.

pub mod error;
pub mod manifest;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::AtlasError;
pub use manifest::{
    CORE_API_VERSION, ConfigSchema, MANIFEST_FILE_NAME, PluginManifest, SchemaType,
};
pub use types::{
    Capabilities, Capability, ComponentCounts, HealthReport, HealthStatus, PluginConfig,
    SinkPlugin, SourcePlugin, WorkflowPlugin,
};

pub use traits::{ExternalPlugin, PluginModuleLoader, PluginRegistry};
