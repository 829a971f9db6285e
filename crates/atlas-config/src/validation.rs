// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as unique plugin ids and well-formed version strings.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::AtlasConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &AtlasConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log_level `{}` is not one of: {}",
                config.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    let mut seen_ids = HashSet::new();
    for (index, plugin) in config.plugin_configs().iter().enumerate() {
        if plugin.id.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("plugins[{index}].id must not be empty"),
            });
        } else if !seen_ids.insert(plugin.id.clone()) {
            errors.push(ConfigError::Validation {
                message: format!("plugins[{index}].id `{}` is used more than once", plugin.id),
            });
        }

        if plugin.source.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("plugins[{index}].source must not be empty"),
            });
        }
    }

    if !is_major_minor(&config.core.api_version) {
        errors.push(ConfigError::Validation {
            message: format!(
                "core.api_version `{}` must have the form <major>.<minor>",
                config.core.api_version
            ),
        });
    }

    if semver::Version::parse(&config.core.version).is_err() {
        errors.push(ConfigError::Validation {
            message: format!(
                "core.version `{}` is not a valid semantic version",
                config.core.version
            ),
        });
    }

    if let Some(dir) = &config.cache.dir {
        if dir.as_os_str().is_empty() {
            errors.push(ConfigError::Validation {
                message: "cache.dir must not be empty when set".to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_major_minor(version: &str) -> bool {
    match version.split_once('.') {
        Some((major, minor)) => {
            !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}
