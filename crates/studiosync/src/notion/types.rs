//! Wire types for the record-store API.

use std::collections::HashMap;

use chrono::DateTime;
use serde::Deserialize;

use crate::codec::TypedProperty;
use crate::remote::{RemoteError, RemotePage};

/// A page object as returned by fetch, create, patch, and query calls.
#[derive(Debug, Clone, Deserialize)]
pub struct PageResponse {
    pub id: String,
    #[serde(default)]
    pub created_time: Option<String>,
    pub last_edited_time: String,
    #[serde(default)]
    pub properties: HashMap<String, TypedProperty>,
}

impl TryFrom<PageResponse> for RemotePage {
    type Error = RemoteError;

    fn try_from(page: PageResponse) -> Result<Self, Self::Error> {
        let last_edited_at = DateTime::parse_from_rfc3339(&page.last_edited_time)
            .map_err(|e| {
                RemoteError::api(
                    200,
                    format!(
                        "page {} has malformed last_edited_time {:?}: {e}",
                        page.id, page.last_edited_time
                    ),
                )
            })?;

        let created_at = page
            .created_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok());

        Ok(RemotePage {
            id: page.id,
            created_at,
            last_edited_at,
            properties: page.properties,
        })
    }
}

/// Response body of a collection query.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    pub results: Vec<PageResponse>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_response_converts_to_remote_page() {
        let json = r#"{
            "id": "page-1",
            "created_time": "2026-01-10T08:00:00.000Z",
            "last_edited_time": "2026-01-12T09:30:00.000Z",
            "properties": {
                "Project": {"type": "title", "title": [{"plain_text": "Acme | Promo"}]}
            }
        }"#;
        let page: PageResponse = serde_json::from_str(json).expect("valid page json");
        let remote = RemotePage::try_from(page).expect("timestamps parse");

        assert_eq!(remote.id, "page-1");
        assert!(remote.created_at.is_some());
        assert!(remote.property("Project").is_some());
    }

    #[test]
    fn malformed_edit_timestamp_is_an_error() {
        let page = PageResponse {
            id: "page-2".to_string(),
            created_time: None,
            last_edited_time: "yesterday".to_string(),
            properties: HashMap::new(),
        };
        let err = RemotePage::try_from(page).expect_err("bad timestamp");
        assert!(err.to_string().contains("page-2"));
    }
}
