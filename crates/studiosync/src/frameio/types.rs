//! Wire types for the asset-review-service API.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Team {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectResponse {
    pub id: String,
    pub root_asset_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetResponse {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentResponse {
    pub id: String,
    #[serde(default)]
    pub text: String,
    pub asset_id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub owner: Option<CommentOwner>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentOwner {
    #[serde(default)]
    pub name: Option<String>,
}
