// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin loading and lifecycle for the Atlas host.
//!
//! A plugin goes through a fixed pipeline:
//!
//! 1. [`source::parse`] turns a descriptor string into a [`PluginSource`].
//! 2. [`Acquirer`] materializes it as a local directory, downloading remote
//!    sources into the [`PluginCache`].
//! 3. [`manifest::read_manifest`] validates `atlas.plugin.json` and the
//!    compatibility gate compares its `apiVersion` with the host's.
//! 4. A [`PluginModuleLoader`](atlas_core::PluginModuleLoader) backend
//!    (by default [`ProcessLoader`]) turns the entry point into a live plugin.
//!
//! [`PluginRuntime`] runs that pipeline for every configured plugin, then
//! handles initialization, registration, health checks, and shutdown.

pub mod acquire;
pub mod archive;
pub mod cache;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod process;
pub mod protocol;
pub mod runtime;
pub mod settings;
pub mod source;

pub use acquire::{AcquireError, AcquireOptions, Acquirer};
pub use cache::PluginCache;
pub use error::{ErrorCode, PluginLoadError};
pub use loader::{FailedLoad, HostVersion, LoadedPlugin, PluginLoadResult, PluginLoader};
pub use manifest::{Compatibility, ManifestError, check_api_compatibility, validate_manifest};
pub use process::{ProcessLoader, ProcessPlugin};
pub use runtime::{LoadOutcome, LoadReport, PluginHealth, PluginRuntime, PluginRuntimeState};
pub use source::{PluginSource, SourceParseError};
