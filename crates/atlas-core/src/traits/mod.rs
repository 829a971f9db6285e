// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the plugin runtime and its collaborators.
//!
//! Async traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod loader;
pub mod plugin;
pub mod registry;

pub use loader::PluginModuleLoader;
pub use plugin::ExternalPlugin;
pub use registry::PluginRegistry;
