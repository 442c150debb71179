//! Artifact feed layer
//!
//! Fetches the version list of each artifact feed, attaches checksums, builds
//! typed entries through the feed's factory and marks the stable entry.
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ FeedSource  │────▶│ HashFetcher │────▶│EntryFactory │────▶│  Stability  │
//! │ (versions)  │     │ (optional)  │     │ (per feed)  │     │  (1 entry)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```

pub mod entry;
pub mod hashes;
pub mod source;
pub mod sources;
pub mod stability;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::FeedError;
use crate::feed::entry::{ArtifactHashes, ArtifactVersion, EntryFactory, MavenCoordinate, RawArtifact};
use crate::feed::hashes::HashFetcher;
use crate::feed::source::FeedSource;
use crate::feed::stability::{StabilityPolicy, load_overrides, resolve_stability};

/// The four feeds a snapshot is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    /// Identifier-mapping builds, one per release
    IdentifierMapping,
    /// Mapping-name builds, many per release
    Mapping,
    /// Numbered builds not tied to a release
    Build,
    /// Plain downloadable artifacts
    Artifact,
}

impl FeedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::IdentifierMapping => "intermediary",
            FeedKind::Mapping => "yarn",
            FeedKind::Build => "loader",
            FeedKind::Artifact => "installer",
        }
    }
}

/// Everything needed to load one feed
#[derive(Clone)]
pub struct FeedSpec {
    pub kind: FeedKind,
    /// `group:artifact:` prepended to every raw version
    pub coordinate_prefix: String,
    pub source: Arc<dyn FeedSource>,
    pub factory: EntryFactory,
    pub stability: StabilityPolicy,
}

/// Turns raw feed artifacts into the immutable entry list of a feed.
///
/// `raw` must be ordered newest first. Each artifact goes through `factory`,
/// then the stable entry is chosen.
pub fn build_feed_entries(
    url: &str,
    raw: Vec<RawArtifact>,
    factory: EntryFactory,
    overrides: Option<&HashSet<String>>,
    policy: &StabilityPolicy,
) -> Result<Vec<ArtifactVersion>, FeedError> {
    let mut entries = raw
        .into_iter()
        .map(factory)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| FeedError::unavailable(url, e))?;

    resolve_stability(&mut entries, overrides, policy);

    Ok(entries)
}

/// Loads feeds described by [`FeedSpec`]s
pub struct FeedLoader {
    hashes: Option<HashFetcher>,
    /// Repository embedded in entry URLs
    public_repository: String,
    /// Repository checksums are fetched from
    fetch_repository: String,
    override_dir: PathBuf,
}

impl FeedLoader {
    pub fn new(
        hashes: Option<HashFetcher>,
        public_repository: &str,
        fetch_repository: &str,
        override_dir: PathBuf,
    ) -> Self {
        Self {
            hashes,
            public_repository: public_repository.to_string(),
            fetch_repository: fetch_repository.to_string(),
            override_dir,
        }
    }

    pub async fn load(&self, spec: &FeedSpec) -> Result<Vec<ArtifactVersion>, FeedError> {
        let url = spec.source.url();
        let versions = spec.source.fetch_versions().await?;

        let coordinates = versions
            .iter()
            .map(|v| MavenCoordinate::parse(&format!("{}{}", spec.coordinate_prefix, v)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| FeedError::unavailable(&url, e))?;

        let hashes = match &self.hashes {
            Some(fetcher) => {
                let urls: Vec<String> = coordinates
                    .iter()
                    .map(|c| c.jar_url(&self.fetch_repository))
                    .collect();
                fetcher.fetch_all(&urls).await
            }
            None => vec![ArtifactHashes::default(); coordinates.len()],
        };

        let raw = coordinates
            .into_iter()
            .zip(hashes)
            .map(|(coordinate, hashes)| RawArtifact {
                url: coordinate.jar_url(&self.public_repository),
                coordinate,
                hashes,
            })
            .collect();

        let overrides = load_overrides(&self.override_dir, &spec.coordinate_prefix);
        let entries = build_feed_entries(
            &url,
            raw,
            spec.factory,
            overrides.as_ref(),
            &spec.stability,
        )?;

        debug!("Loaded {} entries from {} feed", entries.len(), spec.kind.as_str());
        Ok(entries)
    }
}
