//! Joins the merged release list with the artifact feeds

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::feed::entry::{ArtifactVersion, ReleaseMatch};
use crate::release::aggregator::MergedManifest;
use crate::release::manifest::ReleaseRecord;
use crate::release::semver::{normalize, series_of};
use crate::snapshot::database::{
    FeedSet, GameVersion, IdentifierMapping, ReconciledEntry, VersionDatabase,
};

/// Series used when no release in the list has a numeric `major.minor` prefix
const UNKNOWN_SERIES: &str = "0.0";

/// Series of every release: its own `major.minor` prefix, else the one of the
/// nearest newer release that has one, else the nearest older one.
fn resolve_series(releases: &[ReleaseRecord]) -> Vec<String> {
    let own: Vec<Option<&str>> = releases.iter().map(|r| series_of(&r.id)).collect();

    let mut newer: Vec<Option<&str>> = Vec::with_capacity(own.len());
    let mut last = None;
    for series in &own {
        last = series.or(last);
        newer.push(last);
    }

    let mut older: Vec<Option<&str>> = vec![None; own.len()];
    let mut last = None;
    for (i, series) in own.iter().enumerate().rev() {
        last = series.or(last);
        older[i] = last;
    }

    newer
        .into_iter()
        .zip(older)
        .map(|(newer, older)| newer.or(older).unwrap_or(UNKNOWN_SERIES).to_string())
        .collect()
}

/// Builds snapshots and remembers which ids it already warned about
#[derive(Default)]
pub struct VersionReconciler {
    warned: Mutex<HashSet<String>>,
    /// Feed release ids that matched no release in the manifest
    inconsistent: Mutex<HashSet<String>>,
}

impl VersionReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs an excluded release, once per id for the lifetime of the reconciler
    fn warn_missing_mapping(&self, id: &str) {
        let mut warned = self.warned.lock().unwrap_or_else(PoisonError::into_inner);
        if warned.insert(id.to_string()) {
            warn!(
                "Release {} is obfuscated but has no identifier mapping, excluding it",
                id
            );
        } else {
            debug!("Release {} still has no identifier mapping", id);
        }
    }

    /// Logs a feed build targeting a release the manifest does not list, once
    /// per id for the lifetime of the reconciler
    fn warn_inconsistent_mapping(&self, id: &str) {
        let mut inconsistent = self
            .inconsistent
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if inconsistent.insert(id.to_string()) {
            warn!(
                "Feed builds target release {} which is missing from the manifest, ignoring them",
                id
            );
        }
    }

    pub fn reconcile(&self, manifest: &MergedManifest, feeds: FeedSet) -> VersionDatabase {
        let mut mappings: HashMap<&str, &ArtifactVersion> = HashMap::new();
        for build in &feeds.identifier_mapping {
            if let Some(id) = build.release_id() {
                mappings.entry(id).or_insert(build);
            }
        }

        let mut mapping_builds: HashMap<&str, Vec<ArtifactVersion>> = HashMap::new();
        for build in &feeds.mapping {
            if let Some(id) = build.release_id() {
                mapping_builds.entry(id).or_default().push(build.clone());
            }
        }

        let series = resolve_series(&manifest.releases);

        let mut releases = Vec::new();
        let mut reconciled = IndexMap::new();

        for (release, series) in manifest.releases.iter().zip(&series) {
            let identifier_mapping = match mappings.get(release.id.as_str()) {
                Some(build) => IdentifierMapping::Build((*build).clone()),
                None if !release.obfuscated => IdentifierMapping::Noop,
                None => {
                    self.warn_missing_mapping(&release.id);
                    continue;
                }
            };

            let position = releases.len();
            releases.push(GameVersion {
                version: release.id.clone(),
                stable: release.is_stable(),
                semver: normalize(series, &release.id),
            });
            reconciled.insert(
                release.id.clone(),
                ReconciledEntry {
                    release: release.clone(),
                    position,
                    identifier_mapping,
                    mapping_builds: mapping_builds.remove(release.id.as_str()).unwrap_or_default(),
                },
            );
        }

        let mut unmatched: Vec<&str> = mappings
            .keys()
            .chain(mapping_builds.keys())
            .copied()
            .filter(|id| manifest.position(id).is_none())
            .collect();
        unmatched.sort_unstable();
        unmatched.dedup();
        for id in unmatched {
            self.warn_inconsistent_mapping(id);
        }

        debug!(
            "Reconciled {} of {} releases",
            reconciled.len(),
            manifest.releases.len()
        );

        VersionDatabase::new(releases, reconciled, feeds)
    }
}
