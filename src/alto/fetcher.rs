use futures::StreamExt;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use url::Url;

use super::token::{TokenCache, TokenManager};
use super::AltoError;
use crate::config::{Config, Credentials};

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Client for the Alto branch feed.
///
/// Owns a [`TokenManager`]; the token cache is injected so several clients
/// (or tests) can share or isolate it.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    endpoint: Url,
    tokens: TokenManager,
}

impl FeedClient {
    pub fn new(
        client: reqwest::Client,
        endpoint: Url,
        credentials: Credentials,
        cache: Arc<TokenCache>,
    ) -> Self {
        let tokens = TokenManager::new(client.clone(), endpoint.clone(), credentials, cache);
        Self {
            client,
            endpoint,
            tokens,
        }
    }

    /// Builds a client from configuration, resolving credentials from the
    /// environment first and the config file second.
    ///
    /// # Errors
    ///
    /// [`AltoError::Configuration`] if any credential is missing or the base URL
    /// is unusable; [`AltoError::Network`] if the HTTP client cannot be built.
    pub fn from_config(config: &Config, cache: Arc<TokenCache>) -> Result<Self, AltoError> {
        let credentials = Credentials::from_env(&config.alto)?;
        Self::with_credentials(config, credentials, cache)
    }

    pub fn with_credentials(
        config: &Config,
        credentials: Credentials,
        cache: Arc<TokenCache>,
    ) -> Result<Self, AltoError> {
        config.alto.validate()?;
        let endpoint = config.alto.feed_endpoint(&credentials.datafeed_id)?;
        warn_if_insecure(&endpoint);

        let client = reqwest::Client::builder()
            .timeout(config.alto.request_timeout())
            .build()?;
        Ok(Self::new(client, endpoint, credentials, cache))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Fetches the raw branch feed XML.
    ///
    /// A 401 on the first attempt means the cached token went stale: the
    /// cache is cleared, a new token acquired, and the GET issued exactly once
    /// more. There is no other retry.
    ///
    /// # Errors
    ///
    /// - [`AltoError::UpstreamAuth`] - A token could not be obtained
    /// - [`AltoError::FeedFetch`] - Non-2xx response, including a second 401
    /// - [`AltoError::Network`] - Connection, TLS or timeout failure
    /// - [`AltoError::ResponseTooLarge`] - Body exceeded 10MB
    /// - [`AltoError::InvalidUtf8`] - Body was not UTF-8
    pub async fn fetch_feed(&self) -> Result<String, AltoError> {
        let token = self.tokens.ensure_valid_token().await?;
        let mut response = self.get_feed(&token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::info!("Alto token expired or invalid, fetching a new one");
            self.tokens.invalidate();
            let token = self.tokens.acquire_token().await?;
            response = self.get_feed(&token).await?;
        }

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, url = %self.endpoint, "Alto feed request failed");
            return Err(AltoError::feed_status(status));
        }

        let body = read_limited_text(response, MAX_FEED_SIZE).await?;
        tracing::debug!(bytes = body.len(), "Fetched Alto feed");
        Ok(body)
    }

    async fn get_feed(&self, token: &SecretString) -> Result<reqwest::Response, AltoError> {
        let mut auth = HeaderValue::from_str(&format!("Basic {}", token.expose_secret()))
            .map_err(|_| AltoError::UpstreamAuth("token is not a valid header value".into()))?;
        auth.set_sensitive(true);

        let response = self
            .client
            .get(self.endpoint.as_str())
            .header(AUTHORIZATION, auth)
            .header(ACCEPT, "application/xml")
            .send()
            .await?;
        Ok(response)
    }
}

/// SEC-002: credentials travel in every request; flag plain HTTP unless local.
fn warn_if_insecure(endpoint: &Url) {
    let is_local = matches!(endpoint.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));
    if endpoint.scheme() != "https" && !is_local {
        tracing::warn!(url = %endpoint, "Alto endpoint is not HTTPS; credentials are sent in the clear");
    }
}

async fn read_limited_text(response: reqwest::Response, limit: usize) -> Result<String, AltoError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(AltoError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(AltoError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(AltoError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| AltoError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED_PATH: &str = "/FEED1/v10/branch";
    const FEED_XML: &str = "<branches><branch><name>Central</name></branch></branches>";

    fn client(server: &MockServer) -> FeedClient {
        let endpoint = Url::parse(&format!("{}{}", server.uri(), FEED_PATH)).unwrap();
        let credentials = Credentials {
            username: "user".into(),
            password: SecretString::from("pass"),
            datafeed_id: "FEED1".into(),
        };
        FeedClient::new(
            reqwest::Client::new(),
            endpoint,
            credentials,
            Arc::new(TokenCache::new()),
        )
    }

    fn basic(token: &str) -> String {
        format!("Basic {}", STANDARD.encode(token))
    }

    async fn mount_head(server: &MockServer, token: &str, times: u64) {
        Mock::given(method("HEAD"))
            .and(path(FEED_PATH))
            .respond_with(ResponseTemplate::new(200).insert_header("Token", token))
            .up_to_n_times(times)
            .expect(times)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_success_sends_token_and_accept() {
        let server = MockServer::start().await;
        mount_head(&server, "tok1", 1).await;
        Mock::given(method("GET"))
            .and(path(FEED_PATH))
            .and(header("Authorization", basic("tok1").as_str()))
            .and(header("Accept", "application/xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED_XML))
            .expect(1)
            .mount(&server)
            .await;

        let body = client(&server).fetch_feed().await.unwrap();
        assert_eq!(body, FEED_XML);
    }

    #[tokio::test]
    async fn test_second_fetch_reuses_token() {
        let server = MockServer::start().await;
        mount_head(&server, "tok1", 1).await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED_XML))
            .expect(2)
            .mount(&server)
            .await;

        let feed = client(&server);
        feed.fetch_feed().await.unwrap();
        feed.fetch_feed().await.unwrap();
    }

    #[tokio::test]
    async fn test_401_reacquires_and_retries_once() {
        let server = MockServer::start().await;
        mount_head(&server, "stale", 1).await;
        mount_head(&server, "fresh", 1).await;

        Mock::given(method("GET"))
            .and(header("Authorization", basic("stale").as_str()))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(header("Authorization", basic("fresh").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED_XML))
            .expect(1)
            .mount(&server)
            .await;

        let feed = client(&server);
        let body = feed.fetch_feed().await.unwrap();
        assert_eq!(body, FEED_XML);

        // The retried token is now the cached one
        let cached = feed.tokens().ensure_valid_token().await.unwrap();
        assert_eq!(cached.expose_secret(), STANDARD.encode("fresh"));
    }

    #[tokio::test]
    async fn test_second_401_fails_without_third_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).insert_header("Token", "tok"))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let result = client(&server).fetch_feed().await;
        match result {
            Err(AltoError::FeedFetch { status: 401, .. }) => {}
            other => panic!("Expected FeedFetch(401), got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_auth_error_not_retried() {
        let server = MockServer::start().await;
        mount_head(&server, "tok", 1).await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server).fetch_feed().await;
        match result {
            Err(AltoError::FeedFetch { status, reason }) => {
                assert_eq!(status, 500);
                assert_eq!(reason, "Internal Server Error");
            }
            other => panic!("Expected FeedFetch(500), got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_token_failure_skips_feed_request() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = client(&server).fetch_feed().await;
        assert!(matches!(result, Err(AltoError::UpstreamAuth(_))));
    }

    #[tokio::test]
    async fn test_oversized_feed_rejected() {
        let server = MockServer::start().await;
        mount_head(&server, "tok", 1).await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(MAX_FEED_SIZE + 1)))
            .mount(&server)
            .await;

        let result = client(&server).fetch_feed().await;
        assert!(matches!(result, Err(AltoError::ResponseTooLarge(_))));
    }

    #[test]
    fn test_with_credentials_builds_endpoint() {
        let result = FeedClient::with_credentials(
            &Config::default(),
            Credentials {
                username: "u".into(),
                password: SecretString::from("p"),
                datafeed_id: "FEED9".into(),
            },
            Arc::new(TokenCache::new()),
        )
        .unwrap();
        assert_eq!(
            result.endpoint().as_str(),
            "http://webservices.vebra.com/export/FEED9/v10/branch"
        );
    }

    #[test]
    fn test_with_credentials_rejects_zero_timeout() {
        let mut config = Config::default();
        config.alto.request_timeout_secs = 0;
        let result = FeedClient::with_credentials(
            &config,
            Credentials {
                username: "u".into(),
                password: SecretString::from("p"),
                datafeed_id: "FEED9".into(),
            },
            Arc::new(TokenCache::new()),
        );
        assert!(matches!(
            result,
            Err(AltoError::Configuration(ConfigError::InvalidSetting(..)))
        ));
    }
}
