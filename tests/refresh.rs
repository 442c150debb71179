//! Refresh cycle E2E tests against a mock remote

mod helper;

use std::sync::Arc;

use helper::{BUILD_PATH, MAPPING_PATH, TestMeta};
use version_meta::error::{FeedError, RefreshError};
use version_meta::feed::FeedKind;
use version_meta::feed::entry::Stability;
use version_meta::release::obfuscation::ObfuscationStore;
use version_meta::snapshot::IdentifierMapping;

#[tokio::test(flavor = "multi_thread")]
async fn refresh_once_publishes_reconciled_snapshot() {
    let mut meta = TestMeta::new().await;
    let _remote = meta.mock_standard_remote().await;
    let heartbeat = meta.mock_heartbeat().await;

    let refresher = meta.refresher();
    refresher.refresh_once().await.unwrap();

    heartbeat.assert_async().await;
    let db = refresher.published().load().unwrap();

    // 1.21.9 predates the cutoff and has no identifier mapping
    let ids: Vec<&str> = db.releases().iter().map(|r| r.version.as_str()).collect();
    assert_eq!(ids, vec!["25w45a", "1.21.10"]);

    let snapshot = db.reconciled("25w45a").unwrap();
    assert_eq!(snapshot.identifier_mapping, IdentifierMapping::Noop);
    assert!(!snapshot.release.obfuscated);
    assert_eq!(db.releases()[0].semver, "1.21-alpha.25.45.a");
    assert!(!db.releases()[0].stable);

    let release = db.reconciled("1.21.10").unwrap();
    assert!(release.release.obfuscated);
    assert_eq!(
        release.identifier_mapping.build().map(|b| b.version()),
        Some("1.21.10")
    );
    let builds: Vec<&str> = release.mapping_builds.iter().map(|b| b.version()).collect();
    assert_eq!(builds, vec!["1.21.10+build.2", "1.21.10+build.1"]);
    assert!(db.releases()[1].stable);

    assert_eq!(
        db.stable_entry(FeedKind::Build).map(|e| e.version()),
        Some("0.16.10")
    );
    assert_eq!(
        db.stable_entry(FeedKind::Artifact).map(|e| e.version()),
        Some("1.0.1")
    );
    for kind in [
        FeedKind::IdentifierMapping,
        FeedKind::Mapping,
        FeedKind::Build,
        FeedKind::Artifact,
    ] {
        assert_eq!(db.feed(kind).iter().filter(|e| e.is_stable()).count(), 1);
    }
    assert_eq!(
        db.find_by_coordinate(FeedKind::Artifact, "net.fabricmc:fabric-installer:1.0.0")
            .map(|e| e.url.clone()),
        Some(format!(
            "{}/net/fabricmc/fabric-installer/1.0.0/fabric-installer-1.0.0.jar",
            meta.server.url()
        ))
    );

    // Only the post-cutoff snapshot needed a live check
    let cached = meta.cache.load_entries().unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].release_id, "25w45a");
    assert!(!cached[0].obfuscated);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_cycle_keeps_previous_snapshot() {
    let mut meta = TestMeta::new().await;
    let remote = meta.mock_standard_remote().await;
    let _heartbeat = meta.mock_heartbeat().await;

    let refresher = meta.refresher();
    refresher.refresh_once().await.unwrap();
    let before = refresher.published().load().unwrap();

    // remote[3] serves the mapping feed
    remote[3].remove_async().await;
    let _failing = meta.mock_failing_feed(MAPPING_PATH, 503).await;

    let result = refresher.refresh_once().await;

    match result {
        Err(RefreshError::Feed(FeedError::Unavailable { url, .. })) => {
            assert!(url.ends_with(MAPPING_PATH));
        }
        other => panic!("expected feed error, got {other:?}"),
    }
    let after = refresher.published().load().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
}

#[tokio::test(flavor = "multi_thread")]
async fn run_fails_when_first_cycle_fails() {
    let mut meta = TestMeta::new().await;
    let _manifest = meta
        .mock_manifest(&[("1.21.10", "release", "2025-09-30T10:00:00+00:00")])
        .await;
    let _build = meta.mock_failing_feed(BUILD_PATH, 404).await;
    let _others = [
        meta.mock_feed(helper::IDENTIFIER_MAPPING_PATH, &["1.21.10"]).await,
        meta.mock_feed(MAPPING_PATH, &["1.21.10+build.1"]).await,
        meta.mock_feed(helper::ARTIFACT_PATH, &["1.0.1"]).await,
    ];

    let refresher = meta.refresher();
    let result = refresher.run().await;

    assert!(matches!(result, Err(RefreshError::StartupFailure(_))));
    assert!(refresher.published().load().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_feed_aborts_cycle() {
    let mut meta = TestMeta::new().await;
    let _manifest = meta
        .mock_manifest(&[("1.21.10", "release", "2025-09-30T10:00:00+00:00")])
        .await;
    let _feeds = [
        meta.mock_feed(helper::IDENTIFIER_MAPPING_PATH, &[]).await,
        meta.mock_feed(MAPPING_PATH, &["1.21.10+build.1"]).await,
        meta.mock_feed(BUILD_PATH, &["0.16.10"]).await,
        meta.mock_feed(helper::ARTIFACT_PATH, &["1.0.1"]).await,
    ];

    let result = meta.refresher().refresh_once().await;

    assert!(matches!(
        result,
        Err(RefreshError::Feed(FeedError::Empty { .. }))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn overlapping_refresh_is_rejected_as_busy() {
    let mut meta = TestMeta::new().await;
    let _remote = meta.mock_standard_remote().await;
    let _heartbeat = meta.mock_heartbeat().await;

    let refresher = meta.refresher();
    let (first, second) = tokio::join!(refresher.refresh_once(), refresher.refresh_once());

    assert!(first.is_ok());
    assert!(matches!(second, Err(RefreshError::Busy)));
}

#[tokio::test(flavor = "multi_thread")]
async fn obfuscation_cache_survives_restart() {
    let mut meta = TestMeta::new().await;
    let _remote = meta.mock_standard_remote().await;
    let _heartbeat = meta.mock_heartbeat().await;

    meta.refresher().refresh_once().await.unwrap();

    // A second instance over the same database must not fetch the detail again
    let detail = meta
        .server
        .mock("GET", "/v/25w45a.json")
        .with_status(500)
        .expect(0)
        .create_async()
        .await;
    let refresher = meta.refresher();
    refresher.refresh_once().await.unwrap();

    detail.assert_async().await;
    let db = refresher.published().load().unwrap();
    assert!(db.contains_release("25w45a"));
}
