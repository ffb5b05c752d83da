//! Configuration file parser for ~/.config/tourdeck/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Alto credentials may come from the file or from `ALTO_*` environment
//! variables; the environment takes precedence.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const ENV_USERNAME: &str = "ALTO_USERNAME";
pub const ENV_PASSWORD: &str = "ALTO_PASSWORD";
pub const ENV_DATAFEED_ID: &str = "ALTO_DATAFEED_ID";
pub const ENV_TOUR_API_KEY: &str = "RICOH_360_API_KEY";

pub const DEFAULT_BASE_URL: &str = "http://webservices.vebra.com/export";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A mandatory Alto setting is absent from both the environment and the file.
    #[error("Alto API credentials are not configured: set {0}")]
    MissingSetting(&'static str),

    #[error("Invalid Alto base URL: {0}")]
    InvalidBaseUrl(String),

    /// A setting is present but unusable. Carries the key and the reason.
    #[error("Invalid setting {0}: {1}")]
    InvalidSetting(&'static str, &'static str),

    #[error("RICOH 360 API key is not configured: set {0}")]
    MissingApiKey(&'static str),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Alto/Vebra property feed settings.
    pub alto: AltoConfig,
    /// Virtual-tour publishing settings.
    pub tour: TourConfig,
}

/// `[alto]` table.
///
/// SEC-015: Custom Debug impl masks `password` to prevent secret leakage
/// in logs, error messages, and debug output.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AltoConfig {
    /// Export API root; the feed lives at `{base_url}/{datafeed_id}/v10/branch`.
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub datafeed_id: Option<String>,
    /// Whole-request timeout applied to the HTTP client.
    pub request_timeout_secs: u64,
}

impl Default for AltoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: None,
            password: None,
            datafeed_id: None,
            request_timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for AltoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AltoConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("datafeed_id", &self.datafeed_id)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl AltoConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Rejects values that would make every request fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting(
                "alto.request_timeout_secs",
                "must be at least 1 second",
            ));
        }
        Ok(())
    }

    /// Builds `{base_url}/{datafeed_id}/v10/branch`.
    ///
    /// The same URL serves both the token request (HEAD) and the feed (GET).
    pub fn feed_endpoint(&self, datafeed_id: &str) -> Result<Url, ConfigError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ConfigError::InvalidBaseUrl(format!("{}: {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl(format!(
                "unsupported scheme {}",
                url.scheme()
            )));
        }
        url.path_segments_mut()
            .map_err(|_| ConfigError::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push(datafeed_id)
            .push("v10")
            .push("branch");
        Ok(url)
    }
}

/// Feed credentials, fixed for the lifetime of the process.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub datafeed_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("datafeed_id", &self.datafeed_id)
            .finish()
    }
}

impl Credentials {
    /// Resolve credentials from the process environment, falling back to the file.
    pub fn from_env(config: &AltoConfig) -> Result<Self, ConfigError> {
        Self::resolve(config, |key| std::env::var(key).ok())
    }

    /// Resolve credentials using `lookup` for environment values.
    ///
    /// Blank values count as absent. Every setting is mandatory.
    pub fn resolve<F>(config: &AltoConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &'static str, file_value: &Option<String>| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| file_value.clone().filter(|v| !v.trim().is_empty()))
                .ok_or(ConfigError::MissingSetting(key))
        };

        Ok(Self {
            username: pick(ENV_USERNAME, &config.username)?,
            password: SecretString::from(pick(ENV_PASSWORD, &config.password)?),
            datafeed_id: pick(ENV_DATAFEED_ID, &config.datafeed_id)?,
        })
    }
}

/// `[tour]` table.
///
/// SEC-015: Custom Debug impl masks `api_key`.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct TourConfig {
    pub api_key: Option<String>,
}

impl std::fmt::Debug for TourConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TourConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl TourConfig {
    /// Resolve the API key from the process environment, falling back to the file.
    pub fn api_key_from_env(&self) -> Result<SecretString, ConfigError> {
        self.resolve_api_key(|key| std::env::var(key).ok())
    }

    /// Resolve the API key using `lookup` for environment values.
    pub fn resolve_api_key<F>(&self, lookup: F) -> Result<SecretString, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(ENV_TOUR_API_KEY)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|v| !v.trim().is_empty()))
            .map(SecretString::from)
            .ok_or(ConfigError::MissingApiKey(ENV_TOUR_API_KEY))
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    /// - `request_timeout_secs = 0` → `Err(ConfigError::InvalidSetting)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            warn_unknown_keys(&raw);
        }

        let config: Config = toml::from_str(&content)?;
        config.alto.validate()?;
        tracing::info!(path = %path.display(), base_url = %config.alto.base_url, "Loaded configuration");
        Ok(config)
    }
}

fn warn_unknown_keys(raw: &toml::Table) {
    const ALTO_KEYS: [&str; 5] = [
        "base_url",
        "username",
        "password",
        "datafeed_id",
        "request_timeout_secs",
    ];
    const TOUR_KEYS: [&str; 1] = ["api_key"];
    for (key, value) in raw {
        let known: &[&str] = match key.as_str() {
            "alto" => &ALTO_KEYS,
            "tour" => &TOUR_KEYS,
            _ => {
                tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                continue;
            }
        };
        if let Some(table) = value.as_table() {
            for sub_key in table.keys() {
                if !known.contains(&sub_key.as_str()) {
                    tracing::warn!(key = %format!("{}.{}", key, sub_key), "Unknown key in config file, ignoring");
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
