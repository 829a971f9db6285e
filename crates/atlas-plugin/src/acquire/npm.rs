// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::AcquireError;

/// Locates already-installed npm packages. Never installs anything.
pub struct NpmAcquirer {
    base_dir: PathBuf,
}

impl NpmAcquirer {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Walks up from the base directory looking for
    /// `node_modules/<package>/package.json`.
    pub async fn acquire(
        &self,
        package: &str,
        version: Option<&str>,
    ) -> Result<PathBuf, AcquireError> {
        for dir in self.base_dir.ancestors() {
            let package_dir = dir.join("node_modules").join(package);
            let package_json = package_dir.join("package.json");
            if tokio::fs::try_exists(&package_json).await.unwrap_or(false) {
                debug!(package, dir = %package_dir.display(), "resolved npm package");
                if let Some(requested) = version {
                    check_installed_version(package, requested, &package_json).await;
                }
                return Ok(package_dir);
            }
        }

        Err(AcquireError::PackageNotFound {
            package: package.to_string(),
            base: self.base_dir.clone(),
        })
    }
}

/// Warns when the installed package does not satisfy the requested range.
///
/// The installed copy is used either way.
async fn check_installed_version(package: &str, requested: &str, package_json: &Path) {
    let Ok(req) = semver::VersionReq::parse(requested) else {
        debug!(package, requested, "version is not a semver range, not checked");
        return;
    };

    let installed = tokio::fs::read_to_string(package_json)
        .await
        .ok()
        .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok())
        .and_then(|json| json.get("version")?.as_str().map(str::to_string))
        .and_then(|v| semver::Version::parse(&v).ok());

    match installed {
        Some(installed) if !req.matches(&installed) => warn!(
            package,
            requested,
            installed = %installed,
            "installed npm package does not satisfy requested version"
        ),
        Some(_) => {}
        None => debug!(package, "installed package.json has no usable version"),
    }
}
