//! HTTP client for the Notion-style record store.

mod client;
mod types;

pub use client::NotionClient;
pub use types::{PageResponse, QueryResponse};

/// API version header value the service expects.
pub const API_VERSION: &str = "2022-06-28";

/// Production API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.notion.com/v1";
