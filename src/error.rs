use thiserror::Error;


#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

/// Why a remote document could not be turned into data
#[derive(Debug, Error)]
pub enum FetchCause {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed document: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Feed {url} unavailable: {cause}")]
    Unavailable { url: String, cause: FetchCause },

    #[error("Feed {url} returned no versions")]
    Empty { url: String },
}

impl FeedError {
    pub fn unavailable(url: &str, cause: impl Into<FetchCause>) -> Self {
        FeedError::Unavailable {
            url: url.to_string(),
            cause: cause.into(),
        }
    }
}

/// A feed version that cannot be turned into an artifact entry
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryError {
    #[error("invalid maven coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("no build number in version {0}")]
    MissingBuild(String),
}

impl From<EntryError> for FetchCause {
    fn from(e: EntryError) -> Self {
        FetchCause::Malformed(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Manifest {url} unavailable: {cause}")]
    Unavailable { url: String, cause: FetchCause },

    #[error("Cached copy of manifest {url} is unreadable: {source}")]
    CachedCopyCorrupt {
        url: String,
        source: serde_json::Error,
    },

    #[error("Manifest cache error: {0}")]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Obfuscation(#[from] ObfuscationError),
}

#[derive(Debug, Error)]
pub enum ObfuscationError {
    #[error("Obfuscation check failed for {id} ({url}): {reason}")]
    CheckFailure {
        id: String,
        url: String,
        reason: String,
    },

    #[error("Obfuscation cache error: {0}")]
    Store(#[from] CacheError),

    #[error("Obfuscation state lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Obfuscation(#[from] ObfuscationError),

    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),

    #[error("A refresh cycle is already running")]
    Busy,

    #[error("Initial refresh failed, no snapshot to serve: {0}")]
    StartupFailure(Box<RefreshError>),
}
