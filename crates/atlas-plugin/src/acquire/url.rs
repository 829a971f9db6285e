// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::PathBuf;

use tracing::info;

use super::{AcquireError, fetch_and_extract};
use crate::archive::{ArchiveFormat, StripPrefix};
use crate::cache::{PluginCache, url_key};

/// Fetches `.tar.gz`, `.tgz`, or zip archives from arbitrary URLs.
pub struct UrlAcquirer {
    client: reqwest::Client,
    cache: PluginCache,
}

impl UrlAcquirer {
    pub fn new(client: reqwest::Client, cache: PluginCache) -> Self {
        Self { client, cache }
    }

    pub async fn acquire(&self, url: &str) -> Result<PathBuf, AcquireError> {
        let format = ArchiveFormat::for_url(url);
        self.cache
            .get_or_populate(&url_key(url), |dir| async move {
                info!(url, ?format, "downloading plugin archive");
                fetch_and_extract(&self.client, url, dir, format, StripPrefix::SharedTopLevel)
                    .await
            })
            .await
    }
}
