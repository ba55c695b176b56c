//! Record-store client implementation over reqwest.

use async_trait::async_trait;
use backon::Retryable;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::types::{PageResponse, QueryResponse};
use super::{API_VERSION, DEFAULT_BASE_URL};
use crate::rate_limit::{rate_limits, ApiRateLimiter};
use crate::remote::{PropertyPatch, QueryPage, RecordStore, RemoteError, RemotePage, Result};
use crate::retry::default_backoff;

/// Query page size. The API caps cursor queries at 100 results per call.
const QUERY_PAGE_SIZE: u32 = 100;

/// Authenticated record-store client.
///
/// Each call waits on a proactive rate limiter and retries rate-limited
/// responses with jittered exponential backoff.
#[derive(Clone)]
pub struct NotionClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    limiter: ApiRateLimiter,
}

impl NotionClient {
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
            limiter: ApiRateLimiter::new(rate_limits::RECORD_STORE_DEFAULT_RPS),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .header("Notion-Version", API_VERSION)
    }

    /// Map a response to a deserialized body, turning non-success statuses
    /// into [`RemoteError`] values.
    async fn read_response<T: DeserializeOwned>(
        response: Response,
        resource: &str,
    ) -> Result<T> {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::not_found(resource));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(RemoteError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::api(status.as_u16(), body));
        }

        Ok(response.json::<T>().await?)
    }

    async fn query_once(&self, collection_id: &str, cursor: Option<&str>) -> Result<QueryPage> {
        let mut body = json!({ "page_size": QUERY_PAGE_SIZE });
        if let Some(cursor) = cursor {
            body["start_cursor"] = json!(cursor);
        }

        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/databases/{collection_id}/query"),
            )
            .json(&body)
            .send()
            .await?;

        let parsed: QueryResponse =
            Self::read_response(response, &format!("collection {collection_id}")).await?;

        // Pages with unparseable timestamps are dropped rather than failing
        // the whole query; the remaining records still sync.
        let mut results = Vec::with_capacity(parsed.results.len());
        for page in parsed.results {
            match RemotePage::try_from(page) {
                Ok(page) => results.push(page),
                Err(e) => tracing::warn!("skipping malformed page in query result: {e}"),
            }
        }

        Ok(QueryPage {
            results,
            has_more: parsed.has_more,
            next_cursor: parsed.next_cursor,
        })
    }

    async fn fetch_once(&self, page_id: &str) -> Result<RemotePage> {
        let response = self
            .request(reqwest::Method::GET, &format!("/pages/{page_id}"))
            .send()
            .await?;
        let page: PageResponse =
            Self::read_response(response, &format!("page {page_id}")).await?;
        RemotePage::try_from(page)
    }

    async fn create_once(
        &self,
        collection_id: &str,
        properties: &PropertyPatch,
    ) -> Result<RemotePage> {
        let body = json!({
            "parent": { "database_id": collection_id },
            "properties": properties,
        });
        let response = self
            .request(reqwest::Method::POST, "/pages")
            .json(&body)
            .send()
            .await?;
        let page: PageResponse =
            Self::read_response(response, &format!("collection {collection_id}")).await?;
        RemotePage::try_from(page)
    }

    async fn patch_once(&self, page_id: &str, properties: &PropertyPatch) -> Result<RemotePage> {
        let body = json!({ "properties": properties });
        let response = self
            .request(reqwest::Method::PATCH, &format!("/pages/{page_id}"))
            .json(&body)
            .send()
            .await?;
        let page: PageResponse =
            Self::read_response(response, &format!("page {page_id}")).await?;
        RemotePage::try_from(page)
    }

    async fn comment_once(&self, page_id: &str, text: &str) -> Result<()> {
        let body = json!({
            "parent": { "page_id": page_id },
            "rich_text": [{ "text": { "content": text } }],
        });
        let response = self
            .request(reqwest::Method::POST, "/comments")
            .json(&body)
            .send()
            .await?;
        let _: serde_json::Value =
            Self::read_response(response, &format!("page {page_id}")).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for NotionClient {
    async fn query_page(&self, collection_id: &str, cursor: Option<&str>) -> Result<QueryPage> {
        self.limiter.wait().await;
        (|| self.query_once(collection_id, cursor))
            .retry(default_backoff())
            .when(RemoteError::is_rate_limited)
            .await
    }

    async fn fetch_page(&self, page_id: &str) -> Result<RemotePage> {
        self.limiter.wait().await;
        (|| self.fetch_once(page_id))
            .retry(default_backoff())
            .when(RemoteError::is_rate_limited)
            .await
    }

    async fn create_page(
        &self,
        collection_id: &str,
        properties: PropertyPatch,
    ) -> Result<RemotePage> {
        self.limiter.wait().await;
        (|| self.create_once(collection_id, &properties))
            .retry(default_backoff())
            .when(RemoteError::is_rate_limited)
            .await
    }

    async fn patch_page(&self, page_id: &str, properties: PropertyPatch) -> Result<RemotePage> {
        self.limiter.wait().await;
        (|| self.patch_once(page_id, &properties))
            .retry(default_backoff())
            .when(RemoteError::is_rate_limited)
            .await
    }

    async fn append_comment(&self, page_id: &str, body: &str) -> Result<()> {
        self.limiter.wait().await;
        (|| self.comment_once(page_id, body))
            .retry(default_backoff())
            .when(RemoteError::is_rate_limited)
            .await
    }
}
