//! Concurrent readers against the published snapshot slot

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::DateTime;
use version_meta::feed::FeedKind;
use version_meta::feed::entry::{
    ArtifactHashes, ArtifactVersion, MavenCoordinate, RawArtifact, plain_entry,
};
use version_meta::release::aggregator::MergedManifest;
use version_meta::release::manifest::{ReleaseKind, ReleaseRecord};
use version_meta::snapshot::{FeedSet, PublishedDatabase, VersionDatabase, VersionReconciler};

const KINDS: [FeedKind; 4] = [
    FeedKind::IdentifierMapping,
    FeedKind::Mapping,
    FeedKind::Build,
    FeedKind::Artifact,
];

fn feed(kind: FeedKind, size: usize) -> Vec<ArtifactVersion> {
    (0..size)
        .map(|i| {
            let coordinate =
                MavenCoordinate::parse(&format!("net.fabricmc:{}:0.{i}", kind.as_str())).unwrap();
            plain_entry(RawArtifact {
                url: coordinate.jar_url("https://maven.example.net"),
                coordinate,
                hashes: ArtifactHashes::default(),
            })
            .unwrap()
        })
        .collect()
}

fn snapshot(reconciler: &VersionReconciler, size: usize) -> VersionDatabase {
    let releases = (0..size)
        .map(|i| ReleaseRecord {
            id: format!("1.{i}"),
            kind: ReleaseKind::Release,
            source_url: format!("https://example.net/1.{i}.json"),
            content_hash: None,
            release_time: DateTime::parse_from_rfc3339("2025-11-04T11:50:00+00:00").unwrap(),
            obfuscated: false,
        })
        .collect();
    let mut feeds = FeedSet::default();
    for kind in KINDS {
        feeds.set(kind, feed(kind, size));
    }
    reconciler.reconcile(&MergedManifest::new(releases), feeds)
}

#[test]
fn readers_never_observe_a_partial_snapshot() {
    let reconciler = VersionReconciler::new();
    let published = Arc::new(PublishedDatabase::new());
    published.publish(snapshot(&reconciler, 1));

    let done = Arc::new(AtomicBool::new(false));

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let published = published.clone();
            let done = done.clone();
            scope.spawn(move || {
                while !done.load(Ordering::Acquire) {
                    let db = published.load().unwrap();
                    let size = db.releases().len();

                    assert_eq!(db.reconciled_entries().count(), size);
                    for kind in KINDS {
                        assert_eq!(db.feed(kind).len(), size);
                    }
                    for (i, release) in db.releases().iter().enumerate() {
                        assert_eq!(db.position(&release.version), Some(i));
                    }
                }
            });
        }

        for size in 2..200 {
            published.publish(snapshot(&reconciler, size));
        }
        done.store(true, Ordering::Release);
    });

    assert_eq!(published.load().unwrap().releases().len(), 199);
}
