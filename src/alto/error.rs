use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while talking to the Alto export API.
///
/// Each variant is fatal to the current import; the only retry is the single
/// token refresh performed by [`super::FeedClient::fetch_feed`] on a 401.
#[derive(Debug, Error)]
pub enum AltoError {
    /// Required settings are missing or invalid
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    /// Token request was rejected or returned no `Token` header
    #[error("Failed to get Alto token: {0}")]
    UpstreamAuth(String),
    /// Feed request returned a non-2xx status (including a second 401)
    #[error("Failed to fetch Alto properties: {status} {reason}")]
    FeedFetch { status: u16, reason: String },
    /// Feed markup could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
    /// Network-level error (DNS, connection, TLS, timeout)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Response body exceeded the size limit
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
}

impl AltoError {
    pub(crate) fn feed_status(status: reqwest::StatusCode) -> Self {
        AltoError::FeedFetch {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }
}
