//! Directory-listing feed implementation
//!
//! Some repositories expose no metadata document, only an HTML index page
//! with one anchor per version directory.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::error::{FeedError, FetchCause};
use crate::feed::source::{FeedSource, ensure_not_empty};

static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<a\s[^>]*href\s*=\s*"([^"]+)""#).unwrap());

/// Feed backed by an HTML directory listing
pub struct DirectoryListingFeed {
    client: reqwest::Client,
    url: String,
}

impl DirectoryListingFeed {
    pub fn new(client: reqwest::Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

/// Extracts version directory names, in listing order.
///
/// Only relative links ending in `/` count as version directories; the parent
/// link, sibling files (metadata, checksums) and absolute links are skipped.
fn parse_listing(html: &str) -> Vec<String> {
    ANCHOR
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .filter(|href| {
            !href.starts_with('/')
                && !href.starts_with('?')
                && !href.starts_with("..")
                && !href.contains("://")
        })
        .filter_map(|href| href.strip_suffix('/'))
        .filter(|name| !name.is_empty() && !name.contains('/'))
        .map(str::to_string)
        .collect()
}

#[async_trait::async_trait]
impl FeedSource for DirectoryListingFeed {
    fn url(&self) -> String {
        self.url.clone()
    }

    async fn fetch_versions(&self) -> Result<Vec<String>, FeedError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FeedError::unavailable(&self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Directory listing returned status {}: {}", status, self.url);
            return Err(FeedError::unavailable(&self.url, FetchCause::Status(status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::unavailable(&self.url, e))?;

        let mut versions = parse_listing(&body);
        versions.reverse();

        ensure_not_empty(&self.url, versions)
    }
}
