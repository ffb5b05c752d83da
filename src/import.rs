//! The "Import from Alto" action: fetch, parse, then merge into the store.

use thiserror::Error;

use crate::alto::{parse_feed, AltoError, FeedClient};
use crate::store::{ImportSummary, Property, PropertyStore};

/// A failed import, reported to the user as a single message.
///
/// The underlying cause is kept as the error source for logs.
#[derive(Debug, Error)]
#[error("Failed to import properties from Alto. Please check server logs.")]
pub struct ImportError {
    #[source]
    source: AltoError,
}

impl ImportError {
    pub fn alto_error(&self) -> &AltoError {
        &self.source
    }
}

impl From<AltoError> for ImportError {
    fn from(source: AltoError) -> Self {
        tracing::error!(error = %source, "Alto import failed");
        Self { source }
    }
}

/// Fetches and parses the Alto feed without touching any state.
pub async fn fetch_alto_properties(feed: &FeedClient) -> Result<Vec<Property>, ImportError> {
    let xml = feed.fetch_feed().await?;
    if xml.trim().is_empty() {
        tracing::info!("No properties returned from Alto API");
        return Ok(Vec::new());
    }
    Ok(parse_feed(&xml)?)
}

/// Imports Alto properties into `store`, skipping ids it already holds.
///
/// The store is modified only after the whole feed has been fetched and
/// parsed, so a failure leaves it exactly as it was.
pub async fn import_from_alto(
    feed: &FeedClient,
    store: &mut PropertyStore,
) -> Result<ImportSummary, ImportError> {
    let properties = fetch_alto_properties(feed).await?;
    Ok(store.import(properties))
}
