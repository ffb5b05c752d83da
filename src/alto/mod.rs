//! Alto (Vebra) property feed client.
//!
//! - **Tokens**: a HEAD request with account credentials returns a short-lived
//!   token in a response header; it is cached until just before it expires
//! - **Fetching**: GET the branch feed with the token, re-authenticating once
//!   on a 401
//! - **Parsing**: flatten `<branches>/<branch>/<properties>/<property>` into
//!   [`crate::store::Property`] records
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tourdeck::alto::{parse_feed, FeedClient, TokenCache};
//!
//! let feed = FeedClient::from_config(&config, Arc::new(TokenCache::new()))?;
//! let xml = feed.fetch_feed().await?;
//! let properties = parse_feed(&xml)?;
//! ```

mod error;
mod fetcher;
mod parser;
mod token;

pub use error::AltoError;
pub use fetcher::FeedClient;
pub use parser::{parse_feed, ID_PREFIX};
pub use token::{CachedToken, TokenCache, TokenManager};
