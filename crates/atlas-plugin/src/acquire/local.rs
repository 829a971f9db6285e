// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::{Path, PathBuf};

use super::AcquireError;

/// Resolves local plugin directories.
pub struct LocalAcquirer {
    base_dir: PathBuf,
}

impl LocalAcquirer {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Absolute paths are used as given; relative ones are joined to the
    /// base directory.
    pub async fn acquire(&self, path: &str) -> Result<PathBuf, AcquireError> {
        let resolved: PathBuf = self.base_dir.join(Path::new(path)).components().collect();
        if tokio::fs::try_exists(&resolved).await.unwrap_or(false) {
            Ok(resolved)
        } else {
            Err(AcquireError::PathNotFound { path: resolved })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn relative_and_absolute_paths() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("plugins/x")).unwrap();
        let local = LocalAcquirer::new(tmp.path());

        assert_eq!(
            local.acquire("./plugins/x").await.unwrap(),
            tmp.path().join("plugins/x")
        );

        let absolute = tmp.path().join("plugins/x");
        assert_eq!(
            local.acquire(absolute.to_str().unwrap()).await.unwrap(),
            absolute
        );
    }

    #[tokio::test]
    async fn missing_directory_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err = LocalAcquirer::new(tmp.path())
            .acquire("./nope")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("nope"));
    }
}
