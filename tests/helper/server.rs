//! Mock remote fixtures: Maven feeds, release manifest and detail documents

use std::sync::Arc;

use mockito::{Mock, Server, ServerGuard};
use serde_json::json;
use tempfile::TempDir;

use version_meta::cache::Cache;
use version_meta::config::MetaConfig;
use version_meta::refresh::Refresher;
use version_meta::snapshot::PublishedDatabase;

pub const IDENTIFIER_MAPPING_PATH: &str = "/net/fabricmc/intermediary/maven-metadata.xml";
pub const MAPPING_PATH: &str = "/net/fabricmc/yarn/maven-metadata.xml";
pub const BUILD_PATH: &str = "/net/fabricmc/fabric-loader/maven-metadata.xml";
pub const ARTIFACT_PATH: &str = "/net/fabricmc/fabric-installer/maven-metadata.xml";
pub const MANIFEST_PATH: &str = "/mc/version_manifest_v2.json";
pub const HEARTBEAT_PATH: &str = "/heartbeat";

/// `maven-metadata.xml` listing `versions` in publish order (oldest first)
pub fn maven_metadata(versions: &[&str]) -> String {
    let versions: String = versions
        .iter()
        .map(|v| format!("<version>{v}</version>"))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<metadata><versioning><versions>{versions}</versions></versioning></metadata>"
    )
}

/// Release manifest; each release is `(id, type, releaseTime)`
pub fn release_manifest(server_url: &str, releases: &[(&str, &str, &str)]) -> String {
    let versions: Vec<_> = releases
        .iter()
        .map(|(id, kind, time)| {
            json!({
                "id": id,
                "type": kind,
                "url": format!("{server_url}/v/{id}.json"),
                "time": time,
                "releaseTime": time,
            })
        })
        .collect();
    json!({ "versions": versions }).to_string()
}

/// A mock remote plus the on-disk state of one service instance
pub struct TestMeta {
    pub server: ServerGuard,
    pub temp_dir: TempDir,
    pub cache: Arc<Cache>,
}

impl TestMeta {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let temp_dir = TempDir::new().unwrap();
        let cache = Arc::new(Cache::new(&temp_dir.path().join("meta.db")).unwrap());
        Self {
            server,
            temp_dir,
            cache,
        }
    }

    pub fn config(&self) -> MetaConfig {
        MetaConfig {
            maven_url: format!("{}/", self.server.url()),
            manifest_url: format!("{}{}", self.server.url(), MANIFEST_PATH),
            auxiliary_manifest_urls: Vec::new(),
            heartbeat_url: Some(format!("{}{}", self.server.url(), HEARTBEAT_PATH)),
            load_hashes: false,
            data_dir: Some(self.temp_dir.path().to_path_buf()),
            ..Default::default()
        }
    }

    pub fn refresher(&self) -> Refresher {
        Refresher::from_config(
            &self.config(),
            self.cache.clone(),
            Arc::new(PublishedDatabase::new()),
        )
        .unwrap()
    }

    pub async fn mock_feed(&mut self, path: &str, versions: &[&str]) -> Mock {
        self.server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "application/xml")
            .with_body(maven_metadata(versions))
            .create_async()
            .await
    }

    pub async fn mock_failing_feed(&mut self, path: &str, status: usize) -> Mock {
        self.server
            .mock("GET", path)
            .with_status(status)
            .create_async()
            .await
    }

    pub async fn mock_manifest(&mut self, releases: &[(&str, &str, &str)]) -> Mock {
        let body = release_manifest(&self.server.url(), releases);
        self.server
            .mock("GET", MANIFEST_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Detail document of a release; `mappings` decides whether it lists
    /// mapping downloads
    pub async fn mock_detail(&mut self, id: &str, mappings: bool) -> Mock {
        let downloads = if mappings {
            json!({ "client": {}, "client_mappings": {} })
        } else {
            json!({ "client": {}, "server": {} })
        };
        self.server
            .mock("GET", format!("/v/{id}.json").as_str())
            .with_status(200)
            .with_body(json!({ "id": id, "downloads": downloads }).to_string())
            .create_async()
            .await
    }

    pub async fn mock_heartbeat(&mut self) -> Mock {
        self.server
            .mock("HEAD", HEARTBEAT_PATH)
            .with_status(200)
            .create_async()
            .await
    }

    /// Serves the standard fixture: a snapshot after the obfuscation cutoff,
    /// a release with an identifier mapping and one without
    pub async fn mock_standard_remote(&mut self) -> Vec<Mock> {
        vec![
            self.mock_manifest(&[
                ("25w45a", "snapshot", "2025-11-04T11:50:00+00:00"),
                ("1.21.10", "release", "2025-09-30T10:00:00+00:00"),
                ("1.21.9", "release", "2025-09-16T10:00:00+00:00"),
            ])
            .await,
            self.mock_detail("25w45a", false).await,
            self.mock_feed(IDENTIFIER_MAPPING_PATH, &["1.21.8", "1.21.10"])
                .await,
            self.mock_feed(MAPPING_PATH, &["1.21.10+build.1", "1.21.10+build.2"])
                .await,
            self.mock_feed(BUILD_PATH, &["0.16.9", "0.16.10", "0.17.0-beta.1"])
                .await,
            self.mock_feed(ARTIFACT_PATH, &["1.0.0", "1.0.1"]).await,
        ]
    }
}
