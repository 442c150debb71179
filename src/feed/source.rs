//! Feed trait for fetching the raw version list of one artifact feed

#[cfg(test)]
use mockall::automock;

use crate::error::FeedError;

/// Trait for fetching the version list of an artifact feed
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// URL the feed is read from, used to identify it in errors and logs
    fn url(&self) -> String;

    /// Fetches every version string the feed publishes
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Versions ordered from newest to oldest, never empty
    /// * `Err(FeedError)` - If the feed cannot be read, parsed, or is empty
    async fn fetch_versions(&self) -> Result<Vec<String>, FeedError>;
}

/// Rejects an empty version list, which would otherwise erase every known version
pub(crate) fn ensure_not_empty(url: &str, versions: Vec<String>) -> Result<Vec<String>, FeedError> {
    if versions.is_empty() {
        return Err(FeedError::Empty {
            url: url.to_string(),
        });
    }
    Ok(versions)
}
