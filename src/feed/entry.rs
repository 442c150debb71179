//! Artifact feed entries
//!
//! Every feed yields [`ArtifactVersion`] values. The feed-specific parts (a
//! build number, an embedded release id) are composed in as optional pieces and
//! filled in by the factory function configured for the feed.

use serde::Serialize;

use crate::error::EntryError;

/// `group:artifact:version`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MavenCoordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl MavenCoordinate {
    pub fn parse(coordinate: &str) -> Result<Self, EntryError> {
        let mut parts = coordinate.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(group), Some(artifact), Some(version))
                if !group.is_empty() && !artifact.is_empty() && !version.is_empty() =>
            {
                Ok(Self {
                    group: group.to_string(),
                    artifact: artifact.to_string(),
                    version: version.to_string(),
                })
            }
            _ => Err(EntryError::InvalidCoordinate(coordinate.to_string())),
        }
    }

    /// Path of the version directory below the repository root
    pub fn version_path(&self) -> String {
        format!(
            "{}/{}/{}",
            self.group.replace('.', "/"),
            self.artifact,
            self.version
        )
    }

    /// URL of the primary jar below `repository`
    pub fn jar_url(&self, repository: &str) -> String {
        format!(
            "{}/{}/{}-{}.jar",
            repository.trim_end_matches('/'),
            self.version_path(),
            self.artifact,
            self.version
        )
    }
}

impl std::fmt::Display for MavenCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

/// Published checksums of an artifact; `None` means not published
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactHashes {
    pub md5: Option<String>,
    pub sha1: Option<String>,
    pub sha256: Option<String>,
    pub sha512: Option<String>,
}

/// Trailing build number of a versioned build, e.g. `1.21.4+build.8`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildNumber {
    pub separator: BuildSeparator,
    pub build: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildSeparator {
    #[serde(rename = "+build.")]
    PlusBuild,
    #[serde(rename = ".")]
    Dot,
}

impl BuildNumber {
    pub fn parse(version: &str) -> Result<Self, EntryError> {
        let separator = if version.contains("+build.") {
            BuildSeparator::PlusBuild
        } else {
            BuildSeparator::Dot
        };

        let build = version
            .rsplit_once('.')
            .and_then(|(_, tail)| tail.parse().ok())
            .ok_or_else(|| EntryError::MissingBuild(version.to_string()))?;

        Ok(Self { separator, build })
    }
}

/// Splits a mapping-name build version into its target release id,
/// e.g. `1.21.4+build.8` -> `1.21.4`.
///
/// Older builds used `<release>.<n>` or `<release>-<n>` instead.
pub fn mapping_build_release_id(version: &str) -> Result<&str, EntryError> {
    let release = if let Some(index) = version.rfind('+') {
        &version[..index]
    } else {
        let separator = if version.contains('-') { '-' } else { '.' };
        version
            .rfind(separator)
            .map(|index| &version[..index])
            .ok_or_else(|| EntryError::MissingBuild(version.to_string()))?
    };

    if release.is_empty() {
        return Err(EntryError::MissingBuild(version.to_string()));
    }
    Ok(release)
}

/// Version string as it came out of the feed, before any factory ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArtifact {
    pub coordinate: MavenCoordinate,
    pub url: String,
    pub hashes: ArtifactHashes,
}

/// One entry of an artifact feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactVersion {
    pub coordinate: MavenCoordinate,
    pub url: String,
    pub hashes: ArtifactHashes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildNumber>,
    #[serde(rename = "gameVersion", skip_serializing_if = "Option::is_none")]
    pub release_id: Option<String>,
    pub stable: bool,
}

impl ArtifactVersion {
    fn from_raw(raw: RawArtifact) -> Self {
        Self {
            coordinate: raw.coordinate,
            url: raw.url,
            hashes: raw.hashes,
            build: None,
            release_id: None,
            stable: false,
        }
    }

    pub fn version(&self) -> &str {
        &self.coordinate.version
    }
}

/// Capability: carries the single per-feed stability flag
pub trait Stability {
    fn is_stable(&self) -> bool;
    fn mark_stable(&mut self);
}

impl Stability for ArtifactVersion {
    fn is_stable(&self) -> bool {
        self.stable
    }

    fn mark_stable(&mut self) {
        self.stable = true;
    }
}

/// Capability: can be tied to a game release
pub trait ReleaseMatch {
    fn release_id(&self) -> Option<&str>;

    fn matches_release(&self, id: &str) -> bool {
        self.release_id() == Some(id)
    }
}

impl ReleaseMatch for ArtifactVersion {
    fn release_id(&self) -> Option<&str> {
        self.release_id.as_deref()
    }
}

/// Feed-specific constructor applied to every raw feed version
pub type EntryFactory = fn(RawArtifact) -> Result<ArtifactVersion, EntryError>;

/// Artifact with no extra structure (installer builds)
pub fn plain_entry(raw: RawArtifact) -> Result<ArtifactVersion, EntryError> {
    Ok(ArtifactVersion::from_raw(raw))
}

/// Identifier-mapping build: its version is the release id it maps
pub fn identifier_mapping_entry(raw: RawArtifact) -> Result<ArtifactVersion, EntryError> {
    let mut entry = ArtifactVersion::from_raw(raw);
    entry.release_id = Some(entry.coordinate.version.clone());
    Ok(entry)
}

/// Numbered build (loader builds)
pub fn build_entry(raw: RawArtifact) -> Result<ArtifactVersion, EntryError> {
    let build = BuildNumber::parse(&raw.coordinate.version)?;
    let mut entry = ArtifactVersion::from_raw(raw);
    entry.build = Some(build);
    Ok(entry)
}

/// Numbered build whose version embeds its target release id
pub fn mapping_build_entry(raw: RawArtifact) -> Result<ArtifactVersion, EntryError> {
    let release_id = mapping_build_release_id(&raw.coordinate.version)?.to_string();
    let mut entry = build_entry(raw)?;
    entry.release_id = Some(release_id);
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn raw(coordinate: &str) -> RawArtifact {
        let coordinate = MavenCoordinate::parse(coordinate).unwrap();
        RawArtifact {
            url: coordinate.jar_url("https://maven.example.net/"),
            coordinate,
            hashes: ArtifactHashes::default(),
        }
    }

    #[rstest]
    #[case("net.fabricmc:yarn:1.21.4+build.8")]
    #[case("net.fabricmc:fabric-loader:0.16.10")]
    fn maven_coordinate_display_round_trips(#[case] input: &str) {
        assert_eq!(MavenCoordinate::parse(input).unwrap().to_string(), input);
    }

    #[rstest]
    #[case("net.fabricmc:yarn")]
    #[case("net.fabricmc::1.0")]
    #[case("")]
    fn maven_coordinate_rejects_incomplete_input(#[case] input: &str) {
        assert_eq!(
            MavenCoordinate::parse(input),
            Err(EntryError::InvalidCoordinate(input.to_string()))
        );
    }

    #[test]
    fn jar_url_follows_repository_layout() {
        let coordinate = MavenCoordinate::parse("net.fabricmc:fabric-installer:1.0.1").unwrap();
        assert_eq!(
            coordinate.jar_url("https://maven.fabricmc.net/"),
            "https://maven.fabricmc.net/net/fabricmc/fabric-installer/1.0.1/fabric-installer-1.0.1.jar"
        );
    }

    #[rstest]
    #[case("1.21.4+build.8", BuildSeparator::PlusBuild, 8)]
    #[case("0.16.10", BuildSeparator::Dot, 10)]
    #[case("1.14 Pre-Release 1.3", BuildSeparator::Dot, 3)]
    fn build_number_parses_trailing_component(
        #[case] version: &str,
        #[case] separator: BuildSeparator,
        #[case] build: u32,
    ) {
        assert_eq!(
            BuildNumber::parse(version).unwrap(),
            BuildNumber { separator, build }
        );
    }

    #[rstest]
    #[case("1.0.0-beta")]
    #[case("nodots")]
    fn build_number_rejects_non_numeric_tail(#[case] version: &str) {
        assert!(BuildNumber::parse(version).is_err());
    }

    #[rstest]
    #[case("1.21.4+build.8", "1.21.4")]
    #[case("25w45a+build.2", "25w45a")]
    #[case("1.14 Pre-Release 1+build.3", "1.14 Pre-Release 1")]
    #[case("18w49a.1", "18w49a")]
    #[case("1.14-pre1-5", "1.14-pre1")]
    fn mapping_build_release_id_extracts_release(#[case] version: &str, #[case] expected: &str) {
        assert_eq!(mapping_build_release_id(version).unwrap(), expected);
    }

    #[test]
    fn mapping_build_entry_sets_build_and_release() {
        let entry = mapping_build_entry(raw("net.fabricmc:yarn:1.21.4+build.8")).unwrap();

        assert_eq!(entry.release_id(), Some("1.21.4"));
        assert!(entry.matches_release("1.21.4"));
        assert_eq!(entry.build.map(|b| b.build), Some(8));
        assert!(!entry.is_stable());
    }

    #[test]
    fn identifier_mapping_entry_uses_version_as_release() {
        let entry = identifier_mapping_entry(raw("net.fabricmc:intermediary:1.21.4")).unwrap();
        assert_eq!(entry.release_id(), Some("1.21.4"));
        assert!(entry.build.is_none());
    }

    #[test]
    fn build_entry_fails_without_build_number() {
        let result = build_entry(raw("net.fabricmc:fabric-loader:1.0.0-beta"));
        assert!(matches!(result, Err(EntryError::MissingBuild(_))));
    }
}
