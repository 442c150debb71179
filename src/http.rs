//! Shared HTTP client construction

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{CONNECTION, HeaderMap, HeaderValue};

use crate::config::FETCH_TIMEOUT_MS;

const USER_AGENT: &str = concat!("version-meta/", env!("CARGO_PKG_VERSION"));

/// Builds the client used for every feed, manifest and checksum request.
///
/// Connect and read are each bounded by [`FETCH_TIMEOUT_MS`]; a stalled remote
/// call is never cancelled any other way.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(Duration::from_millis(FETCH_TIMEOUT_MS))
        .read_timeout(Duration::from_millis(FETCH_TIMEOUT_MS))
        .build()
}
