//! The immutable version snapshot and its read-only queries

use indexmap::IndexMap;
use serde::Serialize;

use crate::feed::FeedKind;
use crate::feed::entry::{ArtifactVersion, ReleaseMatch, Stability};
use crate::release::manifest::ReleaseRecord;

/// Identifier mapping of a reconciled release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierMapping {
    /// Mapping build published for the release
    Build(ArtifactVersion),
    /// The release ships unobfuscated and needs no mapping
    Noop,
}

impl IdentifierMapping {
    pub fn is_noop(&self) -> bool {
        matches!(self, IdentifierMapping::Noop)
    }

    pub fn build(&self) -> Option<&ArtifactVersion> {
        match self {
            IdentifierMapping::Build(build) => Some(build),
            IdentifierMapping::Noop => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledEntry {
    pub release: ReleaseRecord,
    /// Index of the release in [`VersionDatabase::releases`]
    pub position: usize,
    pub identifier_mapping: IdentifierMapping,
    /// Mapping-name builds targeting the release, newest first
    pub mapping_builds: Vec<ArtifactVersion>,
}

/// Public view of a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameVersion {
    pub version: String,
    pub stable: bool,
    pub semver: String,
}

/// Entries of the four artifact feeds, each ordered newest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSet {
    pub identifier_mapping: Vec<ArtifactVersion>,
    pub mapping: Vec<ArtifactVersion>,
    pub build: Vec<ArtifactVersion>,
    pub artifact: Vec<ArtifactVersion>,
}

impl FeedSet {
    pub fn get(&self, kind: FeedKind) -> &[ArtifactVersion] {
        match kind {
            FeedKind::IdentifierMapping => &self.identifier_mapping,
            FeedKind::Mapping => &self.mapping,
            FeedKind::Build => &self.build,
            FeedKind::Artifact => &self.artifact,
        }
    }

    pub fn set(&mut self, kind: FeedKind, entries: Vec<ArtifactVersion>) {
        match kind {
            FeedKind::IdentifierMapping => self.identifier_mapping = entries,
            FeedKind::Mapping => self.mapping = entries,
            FeedKind::Build => self.build = entries,
            FeedKind::Artifact => self.artifact = entries,
        }
    }
}

/// One consistent snapshot of every release and feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDatabase {
    releases: Vec<GameVersion>,
    reconciled: IndexMap<String, ReconciledEntry>,
    feeds: FeedSet,
}

impl VersionDatabase {
    /// `releases` and `reconciled` must list the same ids in the same order
    pub fn new(
        releases: Vec<GameVersion>,
        reconciled: IndexMap<String, ReconciledEntry>,
        feeds: FeedSet,
    ) -> Self {
        debug_assert!(releases.iter().map(|r| &r.version).eq(reconciled.keys()));
        Self {
            releases,
            reconciled,
            feeds,
        }
    }

    pub fn releases(&self) -> &[GameVersion] {
        &self.releases
    }

    pub fn reconciled(&self, id: &str) -> Option<&ReconciledEntry> {
        self.reconciled.get(id)
    }

    pub fn reconciled_entries(&self) -> impl Iterator<Item = &ReconciledEntry> {
        self.reconciled.values()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.reconciled.get_index_of(id)
    }

    pub fn contains_release(&self, id: &str) -> bool {
        self.reconciled.contains_key(id)
    }

    pub fn feed(&self, kind: FeedKind) -> &[ArtifactVersion] {
        self.feeds.get(kind)
    }

    pub fn stable_entry(&self, kind: FeedKind) -> Option<&ArtifactVersion> {
        self.feed(kind).iter().find(|entry| entry.is_stable())
    }

    pub fn entries_for_release(&self, kind: FeedKind, id: &str) -> Vec<&ArtifactVersion> {
        self.feed(kind)
            .iter()
            .filter(|entry| entry.matches_release(id))
            .collect()
    }

    /// Looks an entry up by `group:artifact:version` or by bare version
    pub fn find_by_coordinate(&self, kind: FeedKind, coordinate: &str) -> Option<&ArtifactVersion> {
        self.feed(kind).iter().find(|entry| {
            entry.version() == coordinate || entry.coordinate.to_string() == coordinate
        })
    }
}
