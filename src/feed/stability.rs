//! Stability flag assignment for a freshly fetched feed
//!
//! Exactly one entry (or none, when an override list excludes every entry) is
//! marked stable. This runs before the feed is handed to any reader.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::feed::entry::{ArtifactVersion, Stability};

/// How a feed picks its stable entry when no override file exists
#[derive(Clone)]
pub enum StabilityPolicy {
    /// Newest entry
    Newest,
    /// Newest entry that parses as a non-prerelease semver version with
    /// `minor >= n`
    MinimumMinor(u64),
    /// Newest entry satisfying the predicate
    FirstMatching(Arc<dyn Fn(&ArtifactVersion) -> bool + Send + Sync>),
}

impl std::fmt::Debug for StabilityPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StabilityPolicy::Newest => write!(f, "Newest"),
            StabilityPolicy::MinimumMinor(n) => write!(f, "MinimumMinor({n})"),
            StabilityPolicy::FirstMatching(_) => write!(f, "FirstMatching(..)"),
        }
    }
}

impl StabilityPolicy {
    fn accepts(&self, entry: &ArtifactVersion) -> bool {
        match self {
            StabilityPolicy::Newest => true,
            StabilityPolicy::MinimumMinor(min) => semver::Version::parse(entry.version())
                .is_ok_and(|v| v.pre.is_empty() && v.minor >= *min),
            StabilityPolicy::FirstMatching(predicate) => predicate(entry),
        }
    }
}

/// File listing the versions of one feed that must never be marked stable.
///
/// The name is derived from the coordinate prefix:
/// `net.fabricmc:yarn:` -> `net_fabricmc_yarn.txt`
pub fn override_file_name(coordinate_prefix: &str) -> String {
    let mut name = coordinate_prefix.replace([':', '.'], "_");
    name.pop();
    name + ".txt"
}

/// Reads the override list for a feed, if one exists
pub fn load_overrides(dir: &Path, coordinate_prefix: &str) -> Option<HashSet<String>> {
    let path: PathBuf = dir.join(override_file_name(coordinate_prefix));

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let versions: HashSet<String> = content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();
            debug!("Loaded {} stability overrides from {:?}", versions.len(), path);
            Some(versions)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!("Ignoring unreadable stability override file {:?}: {}", path, e);
            None
        }
    }
}

/// Marks the stable entry of `entries`, which must be ordered newest first.
///
/// An override list takes precedence over the policy: the newest entry not
/// listed is stable, and if every entry is listed none is.
pub fn resolve_stability(
    entries: &mut [ArtifactVersion],
    overrides: Option<&HashSet<String>>,
    policy: &StabilityPolicy,
) {
    let chosen = match overrides {
        Some(unstable) => entries
            .iter_mut()
            .find(|entry| !unstable.contains(entry.version())),
        None => entries.iter_mut().find(|entry| policy.accepts(entry)),
    };

    if let Some(entry) = chosen {
        entry.mark_stable();
    }
}
