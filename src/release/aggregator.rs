//! Merges the primary and auxiliary release manifests into one classified,
//! deduplicated release list

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use crate::config::CLASSIFY_CONCURRENCY;
use crate::error::{CacheError, FetchCause, ManifestError};
use crate::release::manifest::{ManifestDocument, ManifestVersion, ReleaseKind, ReleaseRecord};
use crate::release::obfuscation::ObfuscationClassifier;

/// Last good raw copy of a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedManifest {
    pub body: Vec<u8>,
    pub fetched_at_ms: i64,
}

/// Storage for raw manifest copies used when the remote is unreachable
pub trait ManifestStore: Send + Sync {
    fn save_manifest(&self, url: &str, body: &[u8]) -> Result<(), CacheError>;
    fn load_manifest(&self, url: &str) -> Result<Option<CachedManifest>, CacheError>;
}

/// Ordered release list with an id -> position index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedManifest {
    pub releases: Vec<ReleaseRecord>,
    positions: HashMap<String, usize>,
}

impl MergedManifest {
    pub fn new(releases: Vec<ReleaseRecord>) -> Self {
        let positions = releases
            .iter()
            .enumerate()
            .map(|(i, release)| (release.id.clone(), i))
            .collect();
        Self {
            releases,
            positions,
        }
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&ReleaseRecord> {
        self.position(id).map(|i| &self.releases[i])
    }
}

fn parse_manifest(body: &[u8]) -> Result<Vec<ManifestVersion>, serde_json::Error> {
    serde_json::from_slice::<ManifestDocument>(body).map(|document| document.versions)
}

/// Concatenates manifest lists, then orders them by priority (high first) and
/// release time (newest first). For duplicate ids the first record after
/// sorting wins. The sort is stable, so equal keys keep their source order.
pub fn merge_manifests(
    lists: Vec<Vec<ManifestVersion>>,
    high_priority: &HashSet<ReleaseKind>,
) -> Vec<ReleaseRecord> {
    let mut versions: Vec<ManifestVersion> = lists.into_iter().flatten().collect();

    versions.sort_by_key(|v| {
        let priority = if high_priority.contains(&v.kind) { 0 } else { 1 };
        (priority, Reverse(v.release_time))
    });

    let mut seen = HashSet::new();
    versions
        .into_iter()
        .filter(|v| seen.insert(v.id.clone()))
        .map(ReleaseRecord::unclassified)
        .collect()
}

pub struct ManifestAggregator {
    client: reqwest::Client,
    primary_url: String,
    auxiliary_urls: Vec<String>,
    high_priority: HashSet<ReleaseKind>,
    store: Arc<dyn ManifestStore>,
    classifier: Arc<ObfuscationClassifier>,
}

impl ManifestAggregator {
    pub fn new(
        client: reqwest::Client,
        primary_url: &str,
        auxiliary_urls: &[String],
        high_priority_kinds: &[String],
        store: Arc<dyn ManifestStore>,
        classifier: Arc<ObfuscationClassifier>,
    ) -> Self {
        Self {
            client,
            primary_url: primary_url.to_string(),
            auxiliary_urls: auxiliary_urls.to_vec(),
            high_priority: high_priority_kinds
                .iter()
                .map(|kind| ReleaseKind::from(kind.clone()))
                .collect(),
            store,
            classifier,
        }
    }

    async fn fetch_raw(&self, url: &str) -> Result<Vec<u8>, FetchCause> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchCause::Status(status));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn fetch_parsed(&self, url: &str) -> Result<(Vec<u8>, Vec<ManifestVersion>), FetchCause> {
        let body = self.fetch_raw(url).await?;
        let versions = parse_manifest(&body).map_err(|e| FetchCause::Malformed(e.to_string()))?;
        Ok((body, versions))
    }

    /// Fetches the primary manifest, falling back to the last good copy
    async fn fetch_primary(&self) -> Result<Vec<ManifestVersion>, ManifestError> {
        let url = &self.primary_url;

        let cause = match self.fetch_parsed(url).await {
            Ok((body, versions)) => {
                if let Err(e) = self.store.save_manifest(url, &body) {
                    warn!("Failed to store copy of manifest {}: {}", url, e);
                }
                return Ok(versions);
            }
            Err(cause) => cause,
        };

        let Some(cached) = self.store.load_manifest(url)? else {
            return Err(ManifestError::Unavailable {
                url: url.clone(),
                cause,
            });
        };

        warn!(
            "Manifest {} unavailable ({}), using copy fetched at {}",
            url,
            cause,
            chrono::DateTime::from_timestamp_millis(cached.fetched_at_ms)
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown time".to_string())
        );

        parse_manifest(&cached.body).map_err(|source| ManifestError::CachedCopyCorrupt {
            url: url.clone(),
            source,
        })
    }

    /// Auxiliary manifests are best effort: failures are logged and skipped
    async fn fetch_auxiliary(&self) -> Vec<Vec<ManifestVersion>> {
        let results = join_all(self.auxiliary_urls.iter().map(|url| async move {
            match self.fetch_parsed(url).await {
                Ok((_, versions)) => {
                    debug!("Fetched {} releases from {}", versions.len(), url);
                    Some(versions)
                }
                Err(cause) => {
                    warn!("Skipping auxiliary manifest {}: {}", url, cause);
                    None
                }
            }
        }))
        .await;

        results.into_iter().flatten().collect()
    }

    /// Builds the merged, classified release list
    pub async fn aggregate(&self) -> Result<MergedManifest, ManifestError> {
        let primary = self.fetch_primary().await?;
        let mut lists = vec![primary];
        lists.extend(self.fetch_auxiliary().await);

        let merged = merge_manifests(lists, &self.high_priority);

        let releases: Vec<ReleaseRecord> = stream::iter(merged)
            .map(|mut record| async move {
                record.obfuscated = self
                    .classifier
                    .classify(
                        &record.id,
                        &record.source_url,
                        record.content_hash.as_deref(),
                        record.release_time,
                    )
                    .await?;
                Ok::<_, ManifestError>(record)
            })
            .buffered(CLASSIFY_CONCURRENCY)
            .try_collect()
            .await?;

        info!("Merged manifest holds {} releases", releases.len());
        Ok(MergedManifest::new(releases))
    }
}
