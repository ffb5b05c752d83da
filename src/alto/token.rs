use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::sync::{Arc, Mutex, MutexGuard};
use url::Url;

use super::AltoError;
use crate::config::Credentials;

/// Response header carrying the issued token.
const TOKEN_HEADER: &str = "Token";

/// Upstream tokens live 60 minutes; cache for one less so we never present
/// a token that expires in flight.
const TOKEN_LIFETIME_MINUTES: i64 = 59;

/// A token ready for use as a Basic credential, and when to stop trusting it.
#[derive(Clone)]
pub struct CachedToken {
    pub token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Process-wide token slot, shared between clients through `Arc`.
///
/// The lock is only held to read or replace the slot, never across an await.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached token if `now` is strictly before its expiry.
    pub fn valid_at(&self, now: DateTime<Utc>) -> Option<SecretString> {
        self.lock()
            .as_ref()
            .filter(|cached| now < cached.expires_at)
            .map(|cached| cached.token.clone())
    }

    pub fn store(&self, token: SecretString, expires_at: DateTime<Utc>) {
        *self.lock() = Some(CachedToken { token, expires_at });
    }

    pub fn invalidate(&self) {
        *self.lock() = None;
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.lock().as_ref().map(|cached| cached.expires_at)
    }

    fn lock(&self) -> MutexGuard<'_, Option<CachedToken>> {
        // A panic while holding the guard cannot leave the Option half-written.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Obtains feed tokens with the account credentials and caches them.
#[derive(Debug, Clone)]
pub struct TokenManager {
    client: reqwest::Client,
    endpoint: Url,
    credentials: Credentials,
    cache: Arc<TokenCache>,
}

impl TokenManager {
    pub fn new(
        client: reqwest::Client,
        endpoint: Url,
        credentials: Credentials,
        cache: Arc<TokenCache>,
    ) -> Self {
        Self {
            client,
            endpoint,
            credentials,
            cache,
        }
    }

    /// Returns the cached token while it is still valid, otherwise acquires a new one.
    pub async fn ensure_valid_token(&self) -> Result<SecretString, AltoError> {
        if let Some(token) = self.cache.valid_at(Utc::now()) {
            tracing::debug!("Reusing cached Alto token");
            return Ok(token);
        }
        self.acquire_token().await
    }

    /// Sends a HEAD request to the feed URL to obtain a fresh token.
    ///
    /// The `Token` header value is base64-encoded once more before caching;
    /// that wrapped value is what the feed GET sends as its Basic credential.
    ///
    /// # Errors
    ///
    /// - [`AltoError::UpstreamAuth`] - Non-2xx response, or no usable `Token` header
    /// - [`AltoError::Network`] - Connection, TLS or timeout failure
    pub async fn acquire_token(&self) -> Result<SecretString, AltoError> {
        let response = self
            .client
            .head(self.endpoint.as_str())
            .basic_auth(
                &self.credentials.username,
                Some(self.credentials.password.expose_secret()),
            )
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Alto token request rejected");
            return Err(AltoError::UpstreamAuth(
                status
                    .canonical_reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("status {}", status.as_u16())),
            ));
        }

        let raw = response
            .headers()
            .get(TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                AltoError::UpstreamAuth("No token found in Alto API response headers".to_string())
            })?;

        // TODO: confirm against the Vebra export API contract whether the header value is
        // meant to be wrapped again or sent as-is; the current behavior wraps it.
        let token = SecretString::from(STANDARD.encode(raw.as_bytes()));
        let expires_at = Utc::now() + Duration::minutes(TOKEN_LIFETIME_MINUTES);
        self.cache.store(token.clone(), expires_at);

        tracing::info!(expires_at = %expires_at, "Acquired Alto token");
        Ok(token)
    }

    /// Drops the cached token so the next call must acquire a new one.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }
}
