// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content-addressed cache of acquired plugins.
//!
//! Each remote source maps to one subdirectory of the cache root. The
//! existence of that directory is the cache-hit signal; a failed population
//! removes the directory so the next load retries from scratch.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::acquire::AcquireError;

/// Longest human-readable part of a cache key. Keys stay well below the
/// 255-byte file name limit.
const MAX_READABLE_KEY: usize = 120;

/// Hex digest length appended to GitHub keys.
const GITHUB_DIGEST_LEN: usize = 16;

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Cache key for a GitHub archive: `<owner>-<repo>-<ref>-<digest>`.
///
/// Characters outside `[A-Za-z0-9._-]` (slashes in branch names, mostly)
/// become `_` so the key stays a single path component. The readable part
/// is lossy (`a-b/c` and `a/b-c` read the same), so a digest of the exact
/// coordinates keeps distinct sources in distinct entries.
pub fn github_key(owner: &str, repo: &str, git_ref: &str) -> String {
    let readable: String = format!("{owner}-{repo}-{git_ref}")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_READABLE_KEY)
        .collect();
    let digest = sha256_hex(&format!("{owner}/{repo}#{git_ref}"));
    format!("{readable}-{}", &digest[..GITHUB_DIGEST_LEN])
}

/// Cache key for an archive URL: URL-safe base64 of the URL, unpadded.
///
/// Encodings longer than [`MAX_READABLE_KEY`] are truncated and suffixed
/// with the SHA-256 of the full URL.
pub fn url_key(url: &str) -> String {
    let encoded = URL_SAFE_NO_PAD.encode(url.as_bytes());
    if encoded.len() <= MAX_READABLE_KEY {
        return encoded;
    }
    format!("{}-{}", &encoded[..MAX_READABLE_KEY], sha256_hex(url))
}

/// Handle on the cache root directory.
#[derive(Debug, Clone)]
pub struct PluginCache {
    root: PathBuf,
}

impl PluginCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for a cache key. Does not touch the filesystem.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    pub async fn contains(&self, key: &str) -> bool {
        tokio::fs::try_exists(self.entry_path(key))
            .await
            .unwrap_or(false)
    }

    /// Returns the entry directory for `key`, running `populate` first on a miss.
    ///
    /// `populate` receives the freshly created, empty entry directory. If it
    /// fails, the directory is removed and the error is returned.
    pub async fn get_or_populate<F, Fut>(
        &self,
        key: &str,
        populate: F,
    ) -> Result<PathBuf, AcquireError>
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = Result<(), AcquireError>>,
    {
        let dir = self.entry_path(key);
        if self.contains(key).await {
            debug!(key, dir = %dir.display(), "plugin cache hit");
            return Ok(dir);
        }

        debug!(key, dir = %dir.display(), "plugin cache miss");
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| AcquireError::Cache {
                path: dir.clone(),
                source,
            })?;

        if let Err(err) = populate(dir.clone()).await {
            if let Err(cleanup) = tokio::fs::remove_dir_all(&dir).await {
                warn!(
                    dir = %dir.display(),
                    error = %cleanup,
                    "failed to remove partial cache entry"
                );
            }
            return Err(err);
        }
        Ok(dir)
    }

    /// Removes every cached plugin. A missing root is not an error.
    pub async fn clear(&self) -> io::Result<()> {
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Names of the cached entries, sorted. A missing root lists as empty.
    pub async fn list(&self) -> io::Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}
