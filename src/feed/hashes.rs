//! Checksum lookups for feed artifacts
//!
//! A checksum that is missing, unreachable or malformed resolves to `None` for
//! that kind. A failed lookup never fails the feed.

use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::feed::entry::ArtifactHashes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl HashKind {
    pub fn extension(&self) -> &'static str {
        match self {
            HashKind::Md5 => "md5",
            HashKind::Sha1 => "sha1",
            HashKind::Sha256 => "sha256",
            HashKind::Sha512 => "sha512",
        }
    }

    /// Length of the hex digest
    pub fn hex_len(&self) -> usize {
        match self {
            HashKind::Md5 => 32,
            HashKind::Sha1 => 40,
            HashKind::Sha256 => 64,
            HashKind::Sha512 => 128,
        }
    }
}

/// Returns the lowercase digest if `body` holds one of the expected length.
/// Checksum files may carry a trailing file name after the digest.
fn parse_digest(body: &str, kind: HashKind) -> Option<String> {
    let digest = body.split_whitespace().next()?;
    if digest.len() != kind.hex_len() || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(digest.to_ascii_lowercase())
}

pub struct HashFetcher {
    client: reqwest::Client,
    concurrency: usize,
}

impl HashFetcher {
    pub fn new(client: reqwest::Client, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    async fn fetch_one(&self, artifact_url: &str, kind: HashKind) -> Option<String> {
        let url = format!("{}.{}", artifact_url, kind.extension());

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Checksum {} unreachable: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!("Checksum {} not published ({})", url, response.status());
            return None;
        }

        let body = response.text().await.ok()?;
        parse_digest(&body, kind)
    }

    /// Fetches all four checksum kinds of one artifact concurrently
    pub async fn fetch_hashes(&self, artifact_url: &str) -> ArtifactHashes {
        let (md5, sha1, sha256, sha512) = tokio::join!(
            self.fetch_one(artifact_url, HashKind::Md5),
            self.fetch_one(artifact_url, HashKind::Sha1),
            self.fetch_one(artifact_url, HashKind::Sha256),
            self.fetch_one(artifact_url, HashKind::Sha512),
        );

        ArtifactHashes {
            md5,
            sha1,
            sha256,
            sha512,
        }
    }

    /// Fetches checksums for every artifact, at most `concurrency` artifacts at
    /// a time. Results keep the order of `artifact_urls`.
    pub async fn fetch_all(&self, artifact_urls: &[String]) -> Vec<ArtifactHashes> {
        stream::iter(artifact_urls)
            .map(|url| self.fetch_hashes(url))
            .buffered(self.concurrency)
            .collect()
            .await
    }
}
