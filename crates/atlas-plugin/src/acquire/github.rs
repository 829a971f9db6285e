// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::PathBuf;

use tracing::info;

use super::{AcquireError, fetch_and_extract};
use crate::archive::{ArchiveFormat, StripPrefix};
use crate::cache::{PluginCache, github_key};
use crate::source::DEFAULT_GITHUB_REF;

/// Fetches repository tarballs from GitHub into the cache.
pub struct GithubAcquirer {
    client: reqwest::Client,
    cache: PluginCache,
    base_url: String,
}

impl GithubAcquirer {
    pub fn new(client: reqwest::Client, cache: PluginCache, base_url: impl Into<String>) -> Self {
        Self {
            client,
            cache,
            base_url: base_url.into(),
        }
    }

    /// `<base>/<owner>/<repo>/archive/<ref>.tar.gz`
    pub fn archive_url(&self, owner: &str, repo: &str, git_ref: &str) -> String {
        format!(
            "{}/{owner}/{repo}/archive/{git_ref}.tar.gz",
            self.base_url.trim_end_matches('/')
        )
    }

    pub async fn acquire(
        &self,
        owner: &str,
        repo: &str,
        git_ref: Option<&str>,
    ) -> Result<PathBuf, AcquireError> {
        let git_ref = git_ref.unwrap_or(DEFAULT_GITHUB_REF);
        let key = github_key(owner, repo, git_ref);
        let url = self.archive_url(owner, repo, git_ref);

        self.cache
            .get_or_populate(&key, |dir| async move {
                info!(%url, "downloading plugin from GitHub");
                fetch_and_extract(
                    &self.client,
                    &url,
                    dir,
                    ArchiveFormat::TarGz,
                    StripPrefix::TopLevel,
                )
                .await
            })
            .await
    }
}
