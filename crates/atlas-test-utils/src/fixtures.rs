// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Manifest documents and on-disk plugin directories.

use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};

use atlas_core::{MANIFEST_FILE_NAME, PluginManifest};

/// Entry file name used by [`manifest_json`].
pub const ENTRY_FILE: &str = "index.js";

/// A minimal valid manifest document.
pub fn manifest_json(id: &str, api_version: &str) -> Value {
    json!({
        "id": id,
        "name": id,
        "version": "1.0.0",
        "apiVersion": api_version,
        "entry": ENTRY_FILE
    })
}

/// [`manifest_json`] as a typed manifest.
pub fn manifest(id: &str, api_version: &str) -> PluginManifest {
    PluginManifest {
        id: id.to_string(),
        name: id.to_string(),
        version: "1.0.0".to_string(),
        api_version: api_version.to_string(),
        entry: ENTRY_FILE.to_string(),
        description: None,
        author: None,
        exports: None,
        config: None,
        dependencies: Default::default(),
        min_core_version: None,
    }
}

/// Writes `manifest` into `dir` as `atlas.plugin.json`, creating `dir`.
///
/// When the manifest names an entry file, an empty one is created so the
/// entry-exists check passes.
pub fn write_plugin(dir: &Path, manifest: &Value) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let body = serde_json::to_string_pretty(manifest).map_err(io::Error::other)?;
    std::fs::write(dir.join(MANIFEST_FILE_NAME), body)?;

    if let Some(entry) = manifest.get("entry").and_then(Value::as_str) {
        let entry_path = dir.join(entry);
        if let Some(parent) = entry_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if !entry_path.exists() {
            std::fs::write(&entry_path, "")?;
        }
    }
    Ok(dir.to_path_buf())
}

/// Creates `<root>/<name>` holding a plugin with `manifest`.
pub fn plugin_dir(root: &Path, name: &str, manifest: &Value) -> io::Result<PathBuf> {
    write_plugin(&root.join(name), manifest)
}
