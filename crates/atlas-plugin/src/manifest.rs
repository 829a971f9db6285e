// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Manifest reading, validation, and the API compatibility gate.
//!
//! Validation is all-or-nothing: it either returns a fully typed
//! [`PluginManifest`] or the first problem found, checked in a fixed order
//! (shape, required fields, field types, id, entry, version, apiVersion,
//! minCoreVersion).

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use atlas_core::manifest::{ManifestConfig, ManifestExports};
use atlas_core::{MANIFEST_FILE_NAME, PluginManifest};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// Fields every manifest must carry, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 5] = ["id", "name", "version", "apiVersion", "entry"];

static API_VERSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\d+$").unwrap());

/// Reverse-DNS convention for plugin ids (`com.example.plugin`).
static REVERSE_DNS_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9-]*(\.[a-z0-9][a-z0-9-]*)+$").unwrap()
});

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("no {MANIFEST_FILE_NAME} found in {}", dir.display())]
    NotFound { dir: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("manifest must be a JSON object")]
    NotAnObject,

    #[error("manifest is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("manifest field '{field}' has the wrong type: {message}")]
    InvalidType { field: &'static str, message: String },

    #[error("manifest field 'id' must not be empty")]
    EmptyId,

    #[error("manifest entry '{entry}' {reason}")]
    InvalidEntry { entry: String, reason: &'static str },

    #[error("manifest version '{version}' is not a valid semantic version: {source}")]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("manifest apiVersion '{0}' must have the form <major>.<minor>")]
    InvalidApiVersion(String),

    #[error("manifest minCoreVersion '{version}' is not a valid semantic version: {source}")]
    InvalidMinCoreVersion {
        version: String,
        #[source]
        source: semver::Error,
    },
}

impl ManifestError {
    /// True when the manifest file is absent rather than malformed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ManifestError::NotFound { .. })
    }
}

/// Reads and validates `atlas.plugin.json` from a plugin directory.
pub async fn read_manifest(dir: &Path) -> Result<PluginManifest, ManifestError> {
    let path = dir.join(MANIFEST_FILE_NAME);
    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ManifestError::NotFound {
                dir: dir.to_path_buf(),
            });
        }
        Err(source) => return Err(ManifestError::Read { path, source }),
    };

    let value: Value = serde_json::from_str(&raw).map_err(ManifestError::Syntax)?;
    validate_manifest(&value)
}

/// Validates an untyped manifest document.
pub fn validate_manifest(value: &Value) -> Result<PluginManifest, ManifestError> {
    let object = value.as_object().ok_or(ManifestError::NotAnObject)?;

    for field in REQUIRED_FIELDS {
        if !object.contains_key(field) {
            return Err(ManifestError::MissingField(field));
        }
    }

    for field in REQUIRED_FIELDS {
        check_field::<String>(object, field)?;
    }
    check_field::<String>(object, "description")?;
    check_field::<String>(object, "author")?;
    check_field::<ManifestExports>(object, "exports")?;
    check_field::<ManifestConfig>(object, "config")?;
    check_field::<BTreeMap<String, String>>(object, "dependencies")?;
    check_field::<String>(object, "minCoreVersion")?;

    let manifest: PluginManifest =
        serde_json::from_value(value.clone()).map_err(|e| ManifestError::InvalidType {
            field: "manifest",
            message: e.to_string(),
        })?;

    if manifest.id.trim().is_empty() {
        return Err(ManifestError::EmptyId);
    }

    check_entry(&manifest.entry)?;

    semver::Version::parse(&manifest.version).map_err(|source| ManifestError::InvalidVersion {
        version: manifest.version.clone(),
        source,
    })?;

    if !API_VERSION.is_match(&manifest.api_version) {
        return Err(ManifestError::InvalidApiVersion(manifest.api_version.clone()));
    }

    if let Some(min) = &manifest.min_core_version {
        semver::Version::parse(min).map_err(|source| ManifestError::InvalidMinCoreVersion {
            version: min.clone(),
            source,
        })?;
    }

    if !REVERSE_DNS_ID.is_match(&manifest.id) {
        warn!(
            plugin_id = %manifest.id,
            "plugin id does not follow reverse-DNS convention (e.g. com.example.plugin)"
        );
    }

    Ok(manifest)
}

/// The entry must be a relative path that stays inside the plugin directory.
fn check_entry(entry: &str) -> Result<(), ManifestError> {
    let invalid = |reason| {
        Err(ManifestError::InvalidEntry {
            entry: entry.to_string(),
            reason,
        })
    };

    if entry.trim().is_empty() {
        return invalid("must not be empty");
    }
    for component in Path::new(entry).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return invalid("must not leave the plugin directory"),
            Component::RootDir | Component::Prefix(_) => {
                return invalid("must be relative to the plugin directory");
            }
        }
    }
    Ok(())
}

/// Deserializes one field on its own so type errors can name it.
fn check_field<T: DeserializeOwned>(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<(), ManifestError> {
    match object.get(field) {
        None => Ok(()),
        Some(value) => serde_json::from_value::<T>(value.clone())
            .map(|_| ())
            .map_err(|e| ManifestError::InvalidType {
                field,
                message: e.to_string(),
            }),
    }
}

/// Outcome of comparing a plugin's version requirement with the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compatibility {
    pub compatible: bool,
    /// Why the versions are incompatible. `None` when compatible.
    pub message: Option<String>,
}

impl Compatibility {
    fn ok() -> Self {
        Self {
            compatible: true,
            message: None,
        }
    }

    fn incompatible(message: String) -> Self {
        Self {
            compatible: false,
            message: Some(message),
        }
    }
}

/// Splits `major.minor`, treating missing or non-numeric parts as 0.
fn major_minor(version: &str) -> (u64, u64) {
    let mut parts = version.split('.').map(|p| p.parse::<u64>().unwrap_or(0));
    (parts.next().unwrap_or(0), parts.next().unwrap_or(0))
}

/// Compares a plugin's `apiVersion` against the host API version.
///
/// Majors must match. Within a major, a plugin may target an older or equal
/// minor but not a newer one.
pub fn check_api_compatibility(plugin_api: &str, core_api: &str) -> Compatibility {
    let (plugin_major, plugin_minor) = major_minor(plugin_api);
    let (core_major, core_minor) = major_minor(core_api);

    if plugin_major != core_major {
        return Compatibility::incompatible(format!(
            "plugin API version {plugin_api} is incompatible with core API version {core_api}: \
             major versions must match"
        ));
    }

    if plugin_minor > core_minor {
        return Compatibility::incompatible(format!(
            "plugin API version {plugin_api} requires newer features than core API version \
             {core_api} provides"
        ));
    }

    Compatibility::ok()
}

/// Checks a manifest's `minCoreVersion` against the running host version.
///
/// Both strings must already be valid semantic versions; an unparseable host
/// version is reported as incompatible.
pub fn check_core_version(min_core_version: &str, core_version: &str) -> Compatibility {
    let (Ok(min), Ok(core)) = (
        semver::Version::parse(min_core_version),
        semver::Version::parse(core_version),
    ) else {
        return Compatibility::incompatible(format!(
            "cannot compare minCoreVersion {min_core_version} with core version {core_version}"
        ));
    };

    if core < min {
        Compatibility::incompatible(format!(
            "plugin requires core version {min} or newer, host is {core}"
        ))
    } else {
        Compatibility::ok()
    }
}
