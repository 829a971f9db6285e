// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Atlas plugin host tests.
//!
//! Provides in-memory stand-ins for the runtime's collaborators so lifecycle
//! tests run without spawning processes or touching the network.
//!
//! # Components
//!
//! - [`MockRegistry`] - Captures registered sources, workflows, and sinks
//! - [`MockPlugin`] - Plugin with configurable hooks and a shared call log
//! - [`StaticLoader`] - Module loader that hands out pre-registered mocks
//! - [`fixtures`] - Manifest documents and plugin directories on disk

pub mod fixtures;
pub mod mock_plugin;
pub mod mock_registry;
pub mod static_loader;

pub use mock_plugin::{CallLog, MockPlugin};
pub use mock_registry::MockRegistry;
pub use static_loader::StaticLoader;
