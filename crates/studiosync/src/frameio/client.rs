//! Asset-review-service client implementation over reqwest.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::types::{Account, AssetResponse, CommentResponse, ProjectResponse, Team};
use super::DEFAULT_BASE_URL;
use crate::asset::{
    AssetComment, AssetFolder, AssetProject, AssetService, AssetServiceError, Result,
};
use crate::rate_limit::{rate_limits, ApiRateLimiter};

/// Authenticated asset-review-service client.
#[derive(Clone)]
pub struct FrameioClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    limiter: ApiRateLimiter,
}

impl FrameioClient {
    /// Create a client for the production API.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom base URL (tests, proxies).
    #[must_use]
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            limiter: ApiRateLimiter::new(rate_limits::ASSET_SERVICE_DEFAULT_RPS),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
    }

    async fn read_response<T: DeserializeOwned>(response: Response, resource: &str) -> Result<T> {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(AssetServiceError::not_found(resource));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssetServiceError::api(status.as_u16(), body));
        }

        Ok(response.json::<T>().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, resource: &str) -> Result<T> {
        self.limiter.wait().await;
        let response = self.request(reqwest::Method::GET, path).send().await?;
        Self::read_response(response, resource).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
        resource: &str,
    ) -> Result<T> {
        self.limiter.wait().await;
        let response = self
            .request(reqwest::Method::POST, path)
            .json(&body)
            .send()
            .await?;
        Self::read_response(response, resource).await
    }

    /// Resolve the first visible account and team, the target workspace
    /// for project creation.
    async fn resolve_team(&self) -> Result<Team> {
        let accounts: Vec<Account> = self.get("/accounts", "accounts").await?;
        let account = accounts
            .into_iter()
            .next()
            .ok_or_else(|| AssetServiceError::no_workspace("token sees no accounts"))?;

        let teams: Vec<Team> = self
            .get(&format!("/accounts/{}/teams", account.id), "teams")
            .await?;
        teams
            .into_iter()
            .next()
            .ok_or_else(|| AssetServiceError::no_workspace("account has no teams"))
    }
}

#[async_trait]
impl AssetService for FrameioClient {
    async fn create_project(&self, name: &str) -> Result<AssetProject> {
        let team = self.resolve_team().await?;

        let project: ProjectResponse = self
            .post(
                &format!("/teams/{}/projects", team.id),
                json!({ "name": name, "private": false }),
                "project creation",
            )
            .await?;

        Ok(AssetProject {
            id: project.id,
            root_asset_id: project.root_asset_id,
            name: project.name,
        })
    }

    async fn create_folder(&self, parent_asset_id: &str, name: &str) -> Result<AssetFolder> {
        let asset: AssetResponse = self
            .post(
                &format!("/assets/{parent_asset_id}/children"),
                json!({ "name": name, "type": "folder" }),
                &format!("asset {parent_asset_id}"),
            )
            .await?;

        Ok(AssetFolder {
            id: asset.id,
            name: asset.name,
        })
    }

    async fn fetch_comment(&self, comment_id: &str) -> Result<AssetComment> {
        let comment: CommentResponse = self
            .get(
                &format!("/comments/{comment_id}"),
                &format!("comment {comment_id}"),
            )
            .await?;

        Ok(AssetComment {
            id: comment.id,
            text: comment.text,
            asset_id: comment.asset_id,
            project_id: comment.project_id,
            author: comment.owner.and_then(|o| o.name),
        })
    }
}
