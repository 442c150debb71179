//! Recurring refresh of the published version snapshot
//!
//! Each cycle builds the release list, loads every feed, reconciles them and
//! swaps the result in. A failed cycle leaves the previous snapshot in place;
//! only the very first cycle is allowed to take the service down.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::try_join_all;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::cache::Cache;
use crate::config::{HASH_FETCH_CONCURRENCY, HEARTBEAT_TIMEOUT_MS, MetaConfig};
use crate::error::RefreshError;
use crate::feed::entry::{
    EntryFactory, build_entry, identifier_mapping_entry, mapping_build_entry, plain_entry,
};
use crate::feed::hashes::HashFetcher;
use crate::feed::source::FeedSource;
use crate::feed::sources::MavenMetadataFeed;
use crate::feed::stability::StabilityPolicy;
use crate::feed::{FeedKind, FeedLoader, FeedSpec};
use crate::http::build_http_client;
use crate::release::aggregator::ManifestAggregator;
use crate::release::obfuscation::{HttpDetailSource, ObfuscationClassifier};
use crate::snapshot::{FeedSet, PublishedDatabase, VersionReconciler};

/// `(kind, group, artifact, factory)` of every feed in a snapshot
const FEEDS: &[(FeedKind, &str, &str, EntryFactory)] = &[
    (
        FeedKind::IdentifierMapping,
        "net.fabricmc",
        "intermediary",
        identifier_mapping_entry,
    ),
    (FeedKind::Mapping, "net.fabricmc", "yarn", mapping_build_entry),
    (FeedKind::Build, "net.fabricmc", "fabric-loader", build_entry),
    (FeedKind::Artifact, "net.fabricmc", "fabric-installer", plain_entry),
];

/// Feed specs for the standard feeds, read from `repository`
pub fn default_feed_specs(
    client: &reqwest::Client,
    repository: &str,
    loader_stable_min_minor: u64,
) -> Vec<FeedSpec> {
    FEEDS
        .iter()
        .map(|&(kind, group, artifact, factory)| {
            let source: Arc<dyn FeedSource> = Arc::new(MavenMetadataFeed::for_artifact(
                client.clone(),
                repository,
                group,
                artifact,
            ));
            let stability = match kind {
                FeedKind::Build => StabilityPolicy::MinimumMinor(loader_stable_min_minor),
                _ => StabilityPolicy::Newest,
            };

            FeedSpec {
                kind,
                coordinate_prefix: format!("{group}:{artifact}:"),
                source,
                factory,
                stability,
            }
        })
        .collect()
}

pub struct Refresher {
    client: reqwest::Client,
    loader: FeedLoader,
    feeds: Vec<FeedSpec>,
    aggregator: ManifestAggregator,
    classifier: Arc<ObfuscationClassifier>,
    reconciler: VersionReconciler,
    published: Arc<PublishedDatabase>,
    heartbeat_url: Option<String>,
    interval: Duration,
    /// Held for the duration of a cycle
    cycle: Mutex<()>,
}

impl Refresher {
    /// Wires the standard feeds, manifests and caches described by `config`
    pub fn from_config(
        config: &MetaConfig,
        cache: Arc<Cache>,
        published: Arc<PublishedDatabase>,
    ) -> Result<Self, RefreshError> {
        let client = build_http_client()?;

        let classifier = Arc::new(ObfuscationClassifier::load(
            Arc::new(HttpDetailSource::new(client.clone())),
            cache.clone(),
        )?);

        let aggregator = ManifestAggregator::new(
            client.clone(),
            &config.manifest_url,
            &config.auxiliary_manifest_urls,
            &config.high_priority_kinds,
            cache,
            classifier.clone(),
        );

        let hashes = config
            .load_hashes
            .then(|| HashFetcher::new(client.clone(), HASH_FETCH_CONCURRENCY));
        let loader = FeedLoader::new(
            hashes,
            &config.maven_url,
            config.fetch_maven_url(),
            config.resolved_override_dir(),
        );

        let feeds = default_feed_specs(
            &client,
            config.fetch_maven_url(),
            config.loader_stable_min_minor,
        );

        Ok(Self {
            client,
            loader,
            feeds,
            aggregator,
            classifier,
            reconciler: VersionReconciler::new(),
            published,
            heartbeat_url: config.heartbeat_url.clone(),
            interval: Duration::from_millis(config.refresh_interval),
            cycle: Mutex::new(()),
        })
    }

    pub fn published(&self) -> &Arc<PublishedDatabase> {
        &self.published
    }

    /// Runs one cycle and publishes its snapshot.
    ///
    /// Returns [`RefreshError::Busy`] without doing anything if another cycle
    /// is in progress.
    pub async fn refresh_once(&self) -> Result<(), RefreshError> {
        let _cycle = self.cycle.try_lock().map_err(|_| RefreshError::Busy)?;
        let start = Instant::now();

        let manifest = self.aggregator.aggregate().await?;

        let loaded = try_join_all(self.feeds.iter().map(|spec| self.loader.load(spec))).await?;
        let mut feeds = FeedSet::default();
        for (spec, entries) in self.feeds.iter().zip(loaded) {
            feeds.set(spec.kind, entries);
        }

        let database = self.reconciler.reconcile(&manifest, feeds);
        let release_count = database.releases().len();
        self.published.publish(database);

        if let Err(e) = self.classifier.persist() {
            error!("Failed to persist obfuscation cache: {}", e);
        }

        self.heartbeat().await;

        info!(
            "Published snapshot with {} releases in {}ms",
            release_count,
            start.elapsed().as_millis()
        );
        Ok(())
    }

    async fn heartbeat(&self) {
        let Some(url) = &self.heartbeat_url else {
            return;
        };

        let result = self
            .client
            .head(url)
            .timeout(Duration::from_millis(HEARTBEAT_TIMEOUT_MS))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => debug!("Heartbeat sent to {}", url),
            Ok(response) => warn!("Heartbeat {} returned status {}", url, response.status()),
            Err(e) => warn!("Heartbeat {} failed: {}", url, e),
        }
    }

    /// Runs the initial cycle, then refreshes forever with a fixed delay
    /// between the end of one cycle and the start of the next.
    pub async fn run(&self) -> Result<(), RefreshError> {
        self.refresh_once()
            .await
            .map_err(|e| RefreshError::StartupFailure(Box::new(e)))?;

        loop {
            sleep(self.interval).await;

            if let Err(e) = self.refresh_once().await {
                error!("Refresh failed, keeping previous snapshot: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FeedKind::IdentifierMapping, "net.fabricmc:intermediary:")]
    #[case(FeedKind::Mapping, "net.fabricmc:yarn:")]
    #[case(FeedKind::Build, "net.fabricmc:fabric-loader:")]
    #[case(FeedKind::Artifact, "net.fabricmc:fabric-installer:")]
    fn default_feed_specs_cover_every_feed(#[case] kind: FeedKind, #[case] prefix: &str) {
        let specs = default_feed_specs(&reqwest::Client::new(), "https://maven.example.net/", 13);

        let spec = specs.iter().find(|s| s.kind == kind).unwrap();
        assert_eq!(spec.coordinate_prefix, prefix);
        assert!(spec.source.url().ends_with("/maven-metadata.xml"));
    }

    #[test]
    fn loader_feed_uses_minimum_minor_policy() {
        let specs = default_feed_specs(&reqwest::Client::new(), "https://maven.example.net/", 13);

        let loader = specs.iter().find(|s| s.kind == FeedKind::Build).unwrap();
        assert!(matches!(loader.stability, StabilityPolicy::MinimumMinor(13)));
    }
}
