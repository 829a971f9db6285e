// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turning a parsed source into a local plugin directory.
//!
//! One strategy per source variant. Remote strategies go through the
//! [`PluginCache`]; npm and local sources resolve in place.

mod github;
mod local;
mod npm;
mod url;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::archive::{ArchiveError, ArchiveFormat, StripPrefix, extract_blocking};
use crate::cache::PluginCache;
use crate::source::PluginSource;

pub use github::GithubAcquirer;
pub use local::LocalAcquirer;
pub use npm::NpmAcquirer;
pub use url::UrlAcquirer;

/// Default host for GitHub archive downloads.
pub const DEFAULT_GITHUB_BASE_URL: &str = "https://github.com";

/// Errors from acquiring a plugin directory.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("npm package '{package}' is not installed in any node_modules above {}", base.display())]
    PackageNotFound { package: String, base: PathBuf },

    #[error("local plugin path '{}' does not exist", path.display())]
    PathNotFound { path: PathBuf },

    #[error("download of {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("download of {url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("plugin cache I/O error at {}: {source}", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AcquireError {
    /// True when the source simply does not exist (as opposed to a failed
    /// download or extraction).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AcquireError::PackageNotFound { .. } | AcquireError::PathNotFound { .. }
        )
    }
}

/// Settings shared by the acquisition strategies.
#[derive(Debug, Clone)]
pub struct AcquireOptions {
    /// Root of the plugin cache.
    pub cache_dir: PathBuf,
    /// Directory that relative local paths and npm lookups start from.
    pub base_dir: PathBuf,
    /// Scheme and host for GitHub archive URLs.
    pub github_base_url: String,
}

impl AcquireOptions {
    /// Options rooted at `cache_dir`, resolving relative sources against the
    /// current working directory.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            base_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            github_base_url: DEFAULT_GITHUB_BASE_URL.to_string(),
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn with_github_base_url(mut self, url: impl Into<String>) -> Self {
        self.github_base_url = url.into();
        self
    }
}

/// Dispatches a [`PluginSource`] to its acquisition strategy.
pub struct Acquirer {
    cache: PluginCache,
    npm: NpmAcquirer,
    local: LocalAcquirer,
    github: GithubAcquirer,
    url: UrlAcquirer,
}

impl Acquirer {
    pub fn new(options: AcquireOptions) -> Result<Self, AcquireError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("atlas/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(AcquireError::Client)?;
        Ok(Self::with_client(options, client))
    }

    /// Builds an acquirer around an existing HTTP client.
    pub fn with_client(options: AcquireOptions, client: reqwest::Client) -> Self {
        let cache = PluginCache::new(options.cache_dir);
        Self {
            npm: NpmAcquirer::new(options.base_dir.clone()),
            local: LocalAcquirer::new(options.base_dir),
            github: GithubAcquirer::new(client.clone(), cache.clone(), options.github_base_url),
            url: UrlAcquirer::new(client, cache.clone()),
            cache,
        }
    }

    pub fn cache(&self) -> &PluginCache {
        &self.cache
    }

    /// Returns a local directory containing the plugin described by `source`.
    pub async fn acquire(&self, source: &PluginSource) -> Result<PathBuf, AcquireError> {
        debug!(kind = source.kind(), source = %source, "acquiring plugin");
        match source {
            PluginSource::Npm { package, version } => {
                self.npm.acquire(package, version.as_deref()).await
            }
            PluginSource::Github {
                owner,
                repo,
                git_ref,
            } => self.github.acquire(owner, repo, git_ref.as_deref()).await,
            PluginSource::Local { path } => self.local.acquire(path).await,
            PluginSource::Url { url } => self.url.acquire(url).await,
        }
    }
}

/// Downloads `url` into `dest`. Any non-2xx status is an error.
pub(crate) async fn download(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<(), AcquireError> {
    let http_err = |source| AcquireError::Http {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(http_err)?;
    let status = response.status();
    if !status.is_success() {
        return Err(AcquireError::Status {
            url: url.to_string(),
            status,
        });
    }

    let bytes = response.bytes().await.map_err(http_err)?;
    debug!(url, bytes = bytes.len(), "downloaded plugin archive");
    tokio::fs::write(dest, &bytes)
        .await
        .map_err(|source| AcquireError::Cache {
            path: dest.to_path_buf(),
            source,
        })
}

/// Downloads an archive into a cache entry, unpacks it there, and deletes
/// the archive file.
pub(crate) async fn fetch_and_extract(
    client: &reqwest::Client,
    url: &str,
    dir: PathBuf,
    format: ArchiveFormat,
    strip: StripPrefix,
) -> Result<(), AcquireError> {
    let archive = dir.join(format.download_name());
    download(client, url, &archive).await?;
    extract_blocking(format, archive.clone(), dir, strip).await?;
    tokio::fs::remove_file(&archive)
        .await
        .map_err(|source| AcquireError::Cache {
            path: archive,
            source,
        })
}
