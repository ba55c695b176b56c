//! Service-agnostic seam for the asset-review service.

use async_trait::async_trait;
use thiserror::Error;

/// A review project on the asset service.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetProject {
    pub id: String,
    /// Root asset under which folders and uploads live.
    pub root_asset_id: String,
    pub name: String,
}

/// A folder asset.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetFolder {
    pub id: String,
    pub name: String,
}

/// A comment on a review asset, as fetched after a webhook event.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetComment {
    pub id: String,
    /// Comment body text.
    pub text: String,
    /// Asset the comment was left on.
    pub asset_id: String,
    /// Review project the comment belongs to, when the service reports it.
    pub project_id: Option<String>,
    /// Display name of the comment author, if available.
    pub author: Option<String>,
}

/// Errors from the asset-review service.
#[derive(Debug, Error)]
pub enum AssetServiceError {
    #[error("asset service API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// No account or team is visible to the token, so there is no target
    /// workspace for project creation.
    #[error("no workspace available: {message}")]
    NoWorkspace { message: String },

    #[error("network error: {message}")]
    Network { message: String },
}

impl AssetServiceError {
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
    pub fn no_workspace(message: impl Into<String>) -> Self {
        Self::NoWorkspace {
            message: message.into(),
        }
    }

    #[inline]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for AssetServiceError {
    fn from(err: reqwest::Error) -> Self {
        Self::network(err.to_string())
    }
}

/// Result type for asset-service operations.
pub type Result<T> = std::result::Result<T, AssetServiceError>;

/// Client contract for the asset-review service.
#[async_trait]
pub trait AssetService: Send + Sync {
    /// Create a review project in the first visible workspace.
    ///
    /// Implementations resolve the target account and team themselves;
    /// [`AssetServiceError::NoWorkspace`] means the token sees none.
    async fn create_project(&self, name: &str) -> Result<AssetProject>;

    /// Create a folder under the given parent asset.
    async fn create_folder(&self, parent_asset_id: &str, name: &str) -> Result<AssetFolder>;

    /// Fetch a comment by id, as referenced by a webhook event.
    async fn fetch_comment(&self, comment_id: &str) -> Result<AssetComment>;
}
