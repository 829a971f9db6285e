// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Atlas plugin host.

use thiserror::Error;

use crate::types::Capability;

/// The primary error type used across plugin traits and core operations.
///
/// Pipeline stages that need a stable error code (manifest lookup, API
/// compatibility, acquisition) have their own error enums in `atlas-plugin`;
/// this type covers everything that crosses a trait boundary.
#[derive(Debug, Error)]
pub enum AtlasError {
    /// A plugin hook reported a failure.
    #[error("plugin '{plugin}' {hook} hook failed: {message}")]
    Hook {
        plugin: String,
        hook: Capability,
        message: String,
        /// Structured detail reported by the plugin, if any.
        details: Option<serde_json::Value>,
    },

    /// A hook was invoked on a plugin that did not declare the capability.
    #[error("plugin '{plugin}' does not implement the {hook} hook")]
    Unsupported { plugin: String, hook: Capability },

    /// The plugin process could not be started or stopped.
    #[error("plugin '{plugin}' process error: {message}")]
    Process {
        plugin: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The plugin violated the host/plugin message contract.
    #[error("plugin '{plugin}' protocol error: {message}")]
    Protocol {
        plugin: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AtlasError {
    /// Structured details carried by the error, falling back to its message.
    ///
    /// Used when a failure has to be reported as data (for example the
    /// synthetic entry produced for a failing health check).
    pub fn details(&self) -> serde_json::Value {
        match self {
            AtlasError::Hook {
                details: Some(details),
                ..
            } => details.clone(),
            other => serde_json::Value::String(other.to_string()),
        }
    }
}
