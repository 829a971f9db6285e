// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stable error codes for plugin loading.
//!
//! Every failure that leaves the load pipeline is a [`PluginLoadError`]
//! carrying one [`ErrorCode`]. Stage-specific errors convert into it with
//! `From`, keeping the original error as the source.

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

use atlas_core::AtlasError;

use crate::acquire::AcquireError;
use crate::manifest::ManifestError;
use crate::source::SourceParseError;

/// Closed set of load failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The plugin directory has no `atlas.plugin.json`.
    ManifestNotFound,
    /// The manifest is not valid JSON or fails validation.
    ManifestInvalid,
    /// The plugin targets an incompatible API or core version.
    ApiVersionMismatch,
    /// Reserved for dependency resolution between plugins.
    DependencyError,
    /// The plugin could not be fetched, parsed, or started.
    LoadError,
    /// The plugin's initialize hook failed.
    InitializationError,
    /// The source or the manifest's entry file does not exist.
    NotFound,
    /// Reserved. Download failures currently report `LOAD_ERROR`.
    NetworkError,
}

/// A plugin load failure with its stable code.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct PluginLoadError {
    pub code: ErrorCode,
    pub message: String,
    #[source]
    pub details: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl PluginLoadError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attaches the underlying error.
    pub fn with_details(mut self, details: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.details = Some(Box::new(details));
        self
    }

    /// Wraps a failed initialize hook.
    pub fn initialization(err: AtlasError) -> Self {
        Self::new(ErrorCode::InitializationError, err.to_string()).with_details(err)
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

impl From<SourceParseError> for PluginLoadError {
    fn from(err: SourceParseError) -> Self {
        Self::new(ErrorCode::LoadError, err.to_string()).with_details(err)
    }
}

impl From<AcquireError> for PluginLoadError {
    fn from(err: AcquireError) -> Self {
        let code = if err.is_not_found() {
            ErrorCode::NotFound
        } else {
            ErrorCode::LoadError
        };
        Self::new(code, err.to_string()).with_details(err)
    }
}

impl From<ManifestError> for PluginLoadError {
    fn from(err: ManifestError) -> Self {
        let code = if err.is_not_found() {
            ErrorCode::ManifestNotFound
        } else {
            ErrorCode::ManifestInvalid
        };
        Self::new(code, err.to_string()).with_details(err)
    }
}

impl From<AtlasError> for PluginLoadError {
    fn from(err: AtlasError) -> Self {
        Self::new(ErrorCode::LoadError, err.to_string()).with_details(err)
    }
}
