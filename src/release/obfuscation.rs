//! Obfuscation classification of releases
//!
//! Every release published before [`FIRST_UNOBFUSCATED_RELEASE_TS`] ships
//! obfuscated. Newer releases are checked against their detail document: a
//! release that still publishes mapping downloads is obfuscated. Live check
//! results are cached by release id and content hash.

#[cfg(test)]
use mockall::automock;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, FixedOffset};
use tracing::{debug, info};

use crate::error::{CacheError, FetchCause, ObfuscationError};

/// 2025-10-01T00:00:00Z as seconds since the UNIX epoch
pub const FIRST_UNOBFUSCATED_RELEASE_TS: i64 = 1_759_276_800;

/// Download keys that only exist for obfuscated releases
const MAPPING_DOWNLOADS: &[&str] = &["client_mappings", "server_mappings"];

/// Persisted classification of one release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObfuscationCacheEntry {
    pub release_id: String,
    pub hash: Option<String>,
    pub obfuscated: bool,
}

/// Storage for the flat classification collection
pub trait ObfuscationStore: Send + Sync {
    fn load_entries(&self) -> Result<Vec<ObfuscationCacheEntry>, CacheError>;

    /// Replaces the whole stored collection with `entries`
    fn replace_entries(&self, entries: &[ObfuscationCacheEntry]) -> Result<(), CacheError>;
}

/// Fetches release detail documents
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait DetailSource: Send + Sync {
    async fn fetch_detail(&self, url: &str) -> Result<String, FetchCause>;
}

pub struct HttpDetailSource {
    client: reqwest::Client,
}

impl HttpDetailSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl DetailSource for HttpDetailSource {
    async fn fetch_detail(&self, url: &str) -> Result<String, FetchCause> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchCause::Status(status));
        }

        Ok(response.text().await?)
    }
}

/// Returns whether a detail document lists mapping downloads
fn has_mapping_downloads(detail: &str) -> Result<bool, String> {
    let document: serde_json::Value =
        serde_json::from_str(detail).map_err(|e| format!("error parsing json: {e}"))?;

    let downloads = document
        .get("downloads")
        .ok_or_else(|| "missing downloads section".to_string())?
        .as_object()
        .ok_or_else(|| "downloads section is not an object".to_string())?;

    Ok(MAPPING_DOWNLOADS.iter().any(|key| downloads.contains_key(*key)))
}

#[derive(Default)]
struct ClassifierState {
    entries: HashMap<String, ObfuscationCacheEntry>,
    dirty: bool,
}

pub struct ObfuscationClassifier {
    detail_source: Arc<dyn DetailSource>,
    store: Arc<dyn ObfuscationStore>,
    state: Mutex<ClassifierState>,
}

impl ObfuscationClassifier {
    /// Creates a classifier seeded with everything `store` holds
    pub fn load(
        detail_source: Arc<dyn DetailSource>,
        store: Arc<dyn ObfuscationStore>,
    ) -> Result<Self, ObfuscationError> {
        let entries: HashMap<String, ObfuscationCacheEntry> = store
            .load_entries()?
            .into_iter()
            .map(|entry| (entry.release_id.clone(), entry))
            .collect();

        info!("Loaded {} cached obfuscation classifications", entries.len());

        Ok(Self {
            detail_source,
            store,
            state: Mutex::new(ClassifierState {
                entries,
                dirty: false,
            }),
        })
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, ClassifierState>, ObfuscationError> {
        self.state.lock().map_err(|_| ObfuscationError::LockPoisoned)
    }

    /// Cached classification, valid unless both hashes are known and differ
    fn cached(&self, id: &str, hash: Option<&str>) -> Result<Option<bool>, ObfuscationError> {
        let state = self.lock_state()?;

        Ok(state.entries.get(id).and_then(|entry| {
            let unchanged = match (hash, entry.hash.as_deref()) {
                (Some(current), Some(stored)) => current.eq_ignore_ascii_case(stored),
                _ => true,
            };
            unchanged.then_some(entry.obfuscated)
        }))
    }

    pub async fn classify(
        &self,
        id: &str,
        detail_url: &str,
        content_hash: Option<&str>,
        release_time: DateTime<FixedOffset>,
    ) -> Result<bool, ObfuscationError> {
        if release_time.timestamp() < FIRST_UNOBFUSCATED_RELEASE_TS {
            return Ok(true);
        }

        if let Some(obfuscated) = self.cached(id, content_hash)? {
            return Ok(obfuscated);
        }

        debug!("Checking obfuscation of {} via {}", id, detail_url);

        let check_failure = |reason: String| ObfuscationError::CheckFailure {
            id: id.to_string(),
            url: detail_url.to_string(),
            reason,
        };

        let detail = self
            .detail_source
            .fetch_detail(detail_url)
            .await
            .map_err(|cause| check_failure(cause.to_string()))?;
        let obfuscated = has_mapping_downloads(&detail).map_err(check_failure)?;

        let mut state = self.lock_state()?;
        state.entries.insert(
            id.to_string(),
            ObfuscationCacheEntry {
                release_id: id.to_string(),
                hash: content_hash.map(str::to_string),
                obfuscated,
            },
        );
        state.dirty = true;

        Ok(obfuscated)
    }

    /// Writes the full cache if anything changed since the last write.
    /// Returns whether a write happened.
    pub fn persist(&self) -> Result<bool, ObfuscationError> {
        let mut state = self.lock_state()?;
        if !state.dirty {
            return Ok(false);
        }

        let mut entries: Vec<ObfuscationCacheEntry> = state.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.release_id.cmp(&b.release_id));

        self.store.replace_entries(&entries)?;
        state.dirty = false;

        debug!("Persisted {} obfuscation classifications", entries.len());
        Ok(true)
    }
}
