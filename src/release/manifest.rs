//! Release manifest documents and the merged release record

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Release channel as named by the manifest `type` field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReleaseKind {
    Release,
    Snapshot,
    OldBeta,
    OldAlpha,
    Experimental,
    Other(String),
}

impl ReleaseKind {
    pub fn as_str(&self) -> &str {
        match self {
            ReleaseKind::Release => "release",
            ReleaseKind::Snapshot => "snapshot",
            ReleaseKind::OldBeta => "old_beta",
            ReleaseKind::OldAlpha => "old_alpha",
            ReleaseKind::Experimental => "experimental",
            ReleaseKind::Other(kind) => kind,
        }
    }
}

impl From<String> for ReleaseKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "release" => ReleaseKind::Release,
            "snapshot" => ReleaseKind::Snapshot,
            "old_beta" => ReleaseKind::OldBeta,
            "old_alpha" => ReleaseKind::OldAlpha,
            "experimental" => ReleaseKind::Experimental,
            _ => ReleaseKind::Other(kind),
        }
    }
}

impl From<ReleaseKind> for String {
    fn from(kind: ReleaseKind) -> Self {
        kind.as_str().to_string()
    }
}

/// `{"versions": [...]}`; other top-level fields are ignored
#[derive(Debug, Deserialize)]
pub struct ManifestDocument {
    pub versions: Vec<ManifestVersion>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestVersion {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ReleaseKind,
    /// Detail document of the release
    pub url: String,
    pub release_time: DateTime<FixedOffset>,
    #[serde(default)]
    pub sha1: Option<String>,
}

/// One release of the merged manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRecord {
    pub id: String,
    pub kind: ReleaseKind,
    pub source_url: String,
    pub content_hash: Option<String>,
    pub release_time: DateTime<FixedOffset>,
    pub obfuscated: bool,
}

impl ReleaseRecord {
    /// Record straight from a manifest, before classification
    pub fn unclassified(version: ManifestVersion) -> Self {
        Self {
            id: version.id,
            kind: version.kind,
            source_url: version.url,
            content_hash: version.sha1,
            release_time: version.release_time,
            obfuscated: false,
        }
    }

    pub fn is_stable(&self) -> bool {
        self.kind == ReleaseKind::Release
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("release", ReleaseKind::Release)]
    #[case("old_alpha", ReleaseKind::OldAlpha)]
    #[case("pending", ReleaseKind::Other("pending".to_string()))]
    fn release_kind_round_trips_through_strings(#[case] raw: &str, #[case] kind: ReleaseKind) {
        assert_eq!(ReleaseKind::from(raw.to_string()), kind);
        assert_eq!(String::from(kind), raw);
    }

    #[test]
    fn manifest_document_parses_versions_and_ignores_extra_fields() {
        let document: ManifestDocument = serde_json::from_value(json!({
            "latest": {"release": "1.21.10", "snapshot": "25w45a"},
            "versions": [
                {
                    "id": "25w45a",
                    "type": "snapshot",
                    "url": "https://piston-meta.example.net/25w45a.json",
                    "time": "2025-11-04T12:00:00+00:00",
                    "releaseTime": "2025-11-04T11:50:00+00:00",
                    "sha1": "5d8f0c5e9a0b3c8d9f0e1a2b3c4d5e6f7a8b9c0d",
                    "complianceLevel": 1
                },
                {
                    "id": "1.0",
                    "type": "release",
                    "url": "https://piston-meta.example.net/1.0.json",
                    "releaseTime": "2011-11-17T22:00:00+00:00"
                }
            ]
        }))
        .unwrap();

        assert_eq!(document.versions.len(), 2);
        assert_eq!(document.versions[0].kind, ReleaseKind::Snapshot);
        assert!(document.versions[1].sha1.is_none());

        let record = ReleaseRecord::unclassified(document.versions[1].clone());
        assert!(record.is_stable());
        assert_eq!(record.source_url, "https://piston-meta.example.net/1.0.json");
    }
}
