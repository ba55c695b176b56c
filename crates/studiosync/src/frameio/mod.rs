//! HTTP client for the Frame.io-style asset-review service.

mod client;
mod types;

pub use client::FrameioClient;

/// Production API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.frame.io/v2";
