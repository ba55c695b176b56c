//! Service-agnostic seam for the external record store.
//!
//! The sync engine is generic over [`RecordStore`], so tests run against a
//! mock and the production binary runs against the HTTP client in
//! [`crate::notion`].

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::codec::TypedProperty;

/// Patch or create payload: property name → typed payload.
pub type PropertyPatch = BTreeMap<String, TypedProperty>;

/// One record (page) of the external collection.
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePage {
    /// Record-store page id.
    pub id: String,
    /// When the page was created, if reported.
    pub created_at: Option<DateTime<FixedOffset>>,
    /// When the page was last edited. Drives the pull "strictly newer" gate.
    pub last_edited_at: DateTime<FixedOffset>,
    /// Typed properties keyed by property name.
    pub properties: HashMap<String, TypedProperty>,
}

impl RemotePage {
    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&TypedProperty> {
        self.properties.get(name)
    }
}

/// One page of a cursor-based collection query.
#[derive(Debug, Clone, Default)]
pub struct QueryPage {
    pub results: Vec<RemotePage>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

/// Errors from the record store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Non-success API response.
    #[error("record store API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Too many requests; honor the retry hint when present.
    #[error("record store rate limited")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Page or collection does not exist (or the token cannot see it).
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Transport-level failure.
    #[error("network error: {message}")]
    Network { message: String },
}

impl RemoteError {
    #[inline]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    #[inline]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    #[inline]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Whether the error is worth retrying with backoff.
    #[inline]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        Self::network(err.to_string())
    }
}

/// Result type for record-store operations.
pub type Result<T> = std::result::Result<T, RemoteError>;

/// Client contract for the external record store.
///
/// Implementations handle auth and wire formats; pagination is the
/// caller's job (the engine loops on [`QueryPage::next_cursor`]), keeping
/// each call a single suspension point for rate limiting and cancellation.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Query one page of the collection (page size 100).
    async fn query_page(&self, collection_id: &str, cursor: Option<&str>) -> Result<QueryPage>;

    /// Fetch a single record by id.
    async fn fetch_page(&self, page_id: &str) -> Result<RemotePage>;

    /// Create a record in the collection. The response carries the
    /// assigned id and edit timestamp.
    async fn create_page(
        &self,
        collection_id: &str,
        properties: PropertyPatch,
    ) -> Result<RemotePage>;

    /// Patch an existing record's properties.
    async fn patch_page(&self, page_id: &str, properties: PropertyPatch) -> Result<RemotePage>;

    /// Append a comment to the record's comment thread.
    async fn append_comment(&self, page_id: &str, body: &str) -> Result<()>;
}
