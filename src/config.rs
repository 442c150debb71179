use serde::Deserialize;
use std::path::{Path, PathBuf};

use thiserror::Error;

// =============================================================================
// Time-related constants
// =============================================================================

/// Delay between the end of one refresh cycle and the start of the next (1 minute)
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 60 * 1000;

/// Connect and read timeout for every remote call in milliseconds (3 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 3_000;

/// Total timeout of the heartbeat ping in milliseconds (5 seconds)
pub const HEARTBEAT_TIMEOUT_MS: u64 = 5_000;

// =============================================================================
// Concurrency limits
// =============================================================================

/// Maximum number of versions whose checksums are fetched at the same time
pub const HASH_FETCH_CONCURRENCY: usize = 8;

/// Maximum number of release detail documents fetched at the same time
pub const CLASSIFY_CONCURRENCY: usize = 8;

// =============================================================================
// Remote defaults
// =============================================================================

pub const DEFAULT_MAVEN_URL: &str = "https://maven.fabricmc.net/";

pub const DEFAULT_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

pub const DEFAULT_AUXILIARY_MANIFEST_URL: &str =
    "https://maven.fabricmc.net/net/minecraft/experimental_versions.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Service configuration, read from an optional JSON file
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct MetaConfig {
    /// Maven URL exposed in artifact URLs. Never fetched from directly.
    pub maven_url: String,
    /// Maven URL this instance fetches feeds and checksums from
    pub local_maven_url: Option<String>,
    pub manifest_url: String,
    pub auxiliary_manifest_urls: Vec<String>,
    /// Release kinds sorted ahead of everything else when manifests are merged
    pub high_priority_kinds: Vec<String>,
    /// URL pinged with a HEAD request after every successful refresh
    pub heartbeat_url: Option<String>,
    /// Fixed delay between refresh cycles in milliseconds
    pub refresh_interval: u64,
    pub load_hashes: bool,
    pub loader_stable_min_minor: u64,
    pub data_dir: Option<PathBuf>,
    /// Directory holding the per-feed stability override files
    pub override_dir: Option<PathBuf>,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            maven_url: DEFAULT_MAVEN_URL.to_string(),
            local_maven_url: None,
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            auxiliary_manifest_urls: vec![DEFAULT_AUXILIARY_MANIFEST_URL.to_string()],
            high_priority_kinds: vec![
                "release".to_string(),
                "snapshot".to_string(),
                "old_beta".to_string(),
                "old_alpha".to_string(),
            ],
            heartbeat_url: None,
            refresh_interval: DEFAULT_REFRESH_INTERVAL_MS,
            load_hashes: true,
            loader_stable_min_minor: 0,
            data_dir: None,
            override_dir: None,
        }
    }
}

impl MetaConfig {
    /// Loads the config file at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Maven URL used for fetching, falling back to the public one
    pub fn fetch_maven_url(&self) -> &str {
        self.local_maven_url.as_deref().unwrap_or(&self.maven_url)
    }

    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(data_dir)
    }

    pub fn resolved_override_dir(&self) -> PathBuf {
        self.override_dir
            .clone()
            .unwrap_or_else(|| self.resolved_data_dir().join("overrides"))
    }

    pub fn db_path(&self) -> PathBuf {
        self.resolved_data_dir().join("meta.db")
    }

    pub fn log_path(&self) -> PathBuf {
        self.resolved_data_dir().join("version-meta.log")
    }
}

/// Returns the path to the data directory for version-meta.
/// Uses $XDG_DATA_HOME/version-meta if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/version-meta,
/// or ./version-meta if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("version-meta")
}
