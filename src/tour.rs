//! Virtual-tour publishing.
//!
//! Publishing is mocked: no RICOH 360 calls are made. A configured API key
//! is still required, and every property gets the same demo tour link.
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::config::{ConfigError, TourConfig, ENV_TOUR_API_KEY};
use crate::store::{PropertyStore, StoreError};

/// Link returned for every generated tour.
pub const MOCK_TOUR_URL: &str =
    "https://kuula.co/share/collection/7q1vF?logo=1&info=1&fs=1&vr=0&sd=1&thumbs=1";

#[derive(Debug, Error)]
pub enum TourError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Publishes property image sets as virtual tours.
pub struct TourPublisher {
    api_key: SecretString,
}

impl std::fmt::Debug for TourPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TourPublisher")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl TourPublisher {
    pub fn new(api_key: SecretString) -> Self {
        Self { api_key }
    }

    /// Builds a publisher with the key from `RICOH_360_API_KEY` or the `[tour]` table.
    pub fn from_config(config: &TourConfig) -> Result<Self, TourError> {
        Ok(Self::new(config.api_key_from_env()?))
    }

    /// Generates a tour for `property_id` and records its link on the property.
    ///
    /// # Errors
    ///
    /// - [`TourError::Configuration`] - The API key is blank
    /// - [`TourError::Store`] - No property has that id
    pub fn generate_tour(
        &self,
        store: &mut PropertyStore,
        property_id: &str,
    ) -> Result<String, TourError> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::MissingApiKey(ENV_TOUR_API_KEY).into());
        }

        tracing::info!(property_id = %property_id, "Generating virtual tour");
        let property = store.set_tour_url(property_id, MOCK_TOUR_URL)?;
        tracing::info!(property_id = %property.id, url = MOCK_TOUR_URL, "Tour generated");
        Ok(MOCK_TOUR_URL.to_string())
    }
}
