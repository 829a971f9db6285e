// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Atlas plugin host.
//!
//! Provides JSON configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, environment variable
//! overrides, and miette diagnostic rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use atlas_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("cache root: {}", config.cache.resolved_dir().display());
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{AtlasConfig, PluginEntry};

/// Load configuration from the XDG hierarchy and validate it.
///
/// On a Figment error the error is converted into miette diagnostics with
/// source spans and typo suggestions.
pub fn load_and_validate() -> Result<AtlasConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let json_sources = collect_json_sources();
            Err(diagnostic::figment_to_config_errors(err, &json_sources))
        }
    }
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<AtlasConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = std::fs::read_to_string(path)
                .map(|content| vec![(path.display().to_string(), content)])
                .unwrap_or_default();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load configuration from a JSON string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(json_content: &str) -> Result<AtlasConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(json_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), json_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Collect JSON source file contents for error span resolution.
fn collect_json_sources() -> Vec<(String, String)> {
    let mut sources = Vec::new();

    if let Ok(content) = std::fs::read_to_string("atlas.json") {
        let path = std::env::current_dir()
            .map(|d| d.join("atlas.json").display().to_string())
            .unwrap_or_else(|_| "atlas.json".to_string());
        sources.push((path, content));
    }

    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join("atlas/atlas.json");
        if let Ok(content) = std::fs::read_to_string(&path) {
            sources.push((path.display().to_string(), content));
        }
    }

    let system_path = Path::new("/etc/atlas/atlas.json");
    if let Ok(content) = std::fs::read_to_string(system_path) {
        sources.push((system_path.display().to_string(), content));
    }

    sources
}
