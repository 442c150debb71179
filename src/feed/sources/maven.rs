//! `maven-metadata.xml` feed implementation

use serde::Deserialize;
use tracing::warn;

use crate::error::{FeedError, FetchCause};
use crate::feed::source::{FeedSource, ensure_not_empty};

#[derive(Debug, Deserialize)]
struct MavenMetadata {
    versioning: Versioning,
}

#[derive(Debug, Deserialize)]
struct Versioning {
    #[serde(default)]
    versions: Versions,
}

#[derive(Debug, Default, Deserialize)]
struct Versions {
    #[serde(default, rename = "version")]
    items: Vec<String>,
}

/// Feed backed by the `maven-metadata.xml` of one artifact
pub struct MavenMetadataFeed {
    client: reqwest::Client,
    url: String,
}

impl MavenMetadataFeed {
    pub fn new(client: reqwest::Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }

    /// Feed for `group:artifact` below `repository`
    pub fn for_artifact(
        client: reqwest::Client,
        repository: &str,
        group: &str,
        artifact: &str,
    ) -> Self {
        let url = format!(
            "{}/{}/{}/maven-metadata.xml",
            repository.trim_end_matches('/'),
            group.replace('.', "/"),
            artifact
        );
        Self::new(client, &url)
    }
}

/// Parses the version list out of a metadata document, oldest first as published
fn parse_metadata(xml: &str) -> Result<Vec<String>, FetchCause> {
    let metadata: MavenMetadata =
        quick_xml::de::from_str(xml).map_err(|e| FetchCause::Malformed(e.to_string()))?;

    Ok(metadata
        .versioning
        .versions
        .items
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect())
}

#[async_trait::async_trait]
impl FeedSource for MavenMetadataFeed {
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
            warn!("Maven feed returned status {}: {}", status, self.url);
            return Err(FeedError::unavailable(&self.url, FetchCause::Status(status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::unavailable(&self.url, e))?;

        let mut versions = parse_metadata(&body).map_err(|cause| {
            warn!("Failed to parse maven metadata {}: {}", self.url, cause);
            FeedError::unavailable(&self.url, cause)
        })?;

        // Metadata lists versions in publish order; callers want newest first
        versions.reverse();

        ensure_not_empty(&self.url, versions)
    }
}
