//! Integration tests for the portal's end-to-end flows.
//!
//! These exercise the public API the way the CLI does: configure the
//! integration, import from the record store, take a client brief, push it
//! back out, and relay a review comment. All remote traffic goes through
//! in-process mocks; every await is bounded by a timeout so a hang fails
//! fast instead of wedging the suite.

#![cfg(feature = "migrate")]

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use studiosync::asset::{AssetComment, AssetFolder, AssetProject, AssetService};
use studiosync::codec::{SelectOption, TextRun, TypedProperty};
use studiosync::connect_and_migrate;
use studiosync::remote::{PropertyPatch, QueryPage, RecordStore, RemoteError, RemotePage};
use studiosync::store::{self, PropertyMapping, SyncSettings};
use studiosync::sync;

/// Maximum time any portal operation should take in tests.
const FLOW_TIMEOUT: Duration = Duration::from_secs(10);

async fn bounded<F, T>(label: &str, fut: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(FLOW_TIMEOUT, fut)
        .await
        .unwrap_or_else(|_| panic!("{label} timed out"))
}

fn ts(s: &str) -> DateTime<FixedOffset> {
    s.parse().expect("timestamp")
}

#[derive(Default)]
struct FakeRecordStore {
    pages: Mutex<Vec<RemotePage>>,
    patches: Mutex<Vec<(String, PropertyPatch)>>,
    comments: Mutex<Vec<(String, String)>>,
}

impl FakeRecordStore {
    fn with_pages(pages: Vec<RemotePage>) -> Self {
        Self {
            pages: Mutex::new(pages),
            ..Default::default()
        }
    }
}

#[async_trait]
impl RecordStore for FakeRecordStore {
    async fn query_page(
        &self,
        _collection_id: &str,
        _cursor: Option<&str>,
    ) -> Result<QueryPage, RemoteError> {
        Ok(QueryPage {
            results: self.pages.lock().expect("pages").clone(),
            has_more: false,
            next_cursor: None,
        })
    }

    async fn fetch_page(&self, page_id: &str) -> Result<RemotePage, RemoteError> {
        self.pages
            .lock()
            .expect("pages")
            .iter()
            .find(|p| p.id == page_id)
            .cloned()
            .ok_or_else(|| RemoteError::not_found(page_id))
    }

    async fn create_page(
        &self,
        _collection_id: &str,
        properties: PropertyPatch,
    ) -> Result<RemotePage, RemoteError> {
        let page = RemotePage {
            id: "page-new".to_string(),
            created_at: Some(ts("2026-04-01T09:00:00Z")),
            last_edited_at: ts("2026-04-01T09:00:00Z"),
            properties: properties.into_iter().collect(),
        };
        self.pages.lock().expect("pages").push(page.clone());
        Ok(page)
    }

    async fn patch_page(
        &self,
        page_id: &str,
        properties: PropertyPatch,
    ) -> Result<RemotePage, RemoteError> {
        self.patches
            .lock()
            .expect("patches")
            .push((page_id.to_string(), properties.clone()));
        Ok(RemotePage {
            id: page_id.to_string(),
            created_at: None,
            last_edited_at: ts("2026-04-01T10:00:00Z"),
            properties: properties.into_iter().collect(),
        })
    }

    async fn append_comment(&self, page_id: &str, body: &str) -> Result<(), RemoteError> {
        self.comments
            .lock()
            .expect("comments")
            .push((page_id.to_string(), body.to_string()));
        Ok(())
    }
}

struct FakeAssetService {
    comment: Option<AssetComment>,
}

#[async_trait]
impl AssetService for FakeAssetService {
    async fn create_project(&self, name: &str) -> studiosync::asset::Result<AssetProject> {
        Ok(AssetProject {
            id: "fio-1".to_string(),
            root_asset_id: "root-1".to_string(),
            name: name.to_string(),
        })
    }

    async fn create_folder(
        &self,
        _parent_asset_id: &str,
        name: &str,
    ) -> studiosync::asset::Result<AssetFolder> {
        Ok(AssetFolder {
            id: "folder-1".to_string(),
            name: name.to_string(),
        })
    }

    async fn fetch_comment(&self, comment_id: &str) -> studiosync::asset::Result<AssetComment> {
        self.comment
            .clone()
            .ok_or_else(|| studiosync::AssetServiceError::not_found(comment_id))
    }
}

fn mapping(name: &str, kind: &str) -> PropertyMapping {
    PropertyMapping {
        name: name.to_string(),
        kind: kind.to_string(),
        local_alias: name.to_lowercase(),
    }
}

fn portal_settings() -> SyncSettings {
    SyncSettings {
        record_store_token: Some("record-token".to_string()),
        collection_id: Some("collection-1".to_string()),
        asset_service_token: Some("asset-token".to_string()),
        webhook_secret: Some("hook-secret".to_string()),
        mappings: vec![
            mapping("Project", "title"),
            mapping("Status", "status"),
            mapping("Deadline", "date"),
        ],
        sync_interval_secs: 30,
    }
}

fn remote_project_page() -> RemotePage {
    RemotePage {
        id: "page-1".to_string(),
        created_at: Some(ts("2026-04-01T08:00:00Z")),
        last_edited_at: ts("2026-04-01T08:00:00Z"),
        properties: [
            (
                "Project".to_string(),
                TypedProperty::Title {
                    title: vec![TextRun {
                        plain_text: Some("Acme | Promo Video".to_string()),
                        text: None,
                    }],
                },
            ),
            (
                "Status".to_string(),
                TypedProperty::Status {
                    status: Some(SelectOption {
                        name: "Editing".to_string(),
                    }),
                },
            ),
        ]
        .into_iter()
        .collect(),
    }
}

#[tokio::test]
async fn import_brief_push_and_comment_relay() {
    let db = connect_and_migrate("sqlite::memory:")
        .await
        .expect("test database");
    let settings = portal_settings();
    store::settings::save(&db, &settings).await.expect("save settings");
    let remote = FakeRecordStore::with_pages(vec![remote_project_page()]);

    // Import the remote record.
    let report = bounded("initial sync", sync::full_sync(&db, &remote, &settings))
        .await
        .expect("sync");
    assert_eq!(report.pulled, 1);
    let project = store::projects::find_by_external_id(&db, "page-1")
        .await
        .expect("lookup")
        .expect("imported");
    assert_eq!(project.full_title(), "Acme | Promo Video");

    // The client fills in the brief; the answers land in the property bag.
    let mut answers = serde_json::Map::new();
    answers.insert("Deadline".to_string(), serde_json::json!("2026-05-01"));
    let project = store::projects::merge_brief_answers(&db, &project.id, &answers)
        .await
        .expect("brief");
    assert!(project.brief_submitted);

    // The next pass pushes the new deadline out.
    let report = bounded("second sync", sync::full_sync(&db, &remote, &settings))
        .await
        .expect("sync");
    assert_eq!(report.pushed, 1);
    let patches = remote.patches.lock().expect("patches");
    let (page_id, patch) = patches.last().expect("a patch");
    assert_eq!(page_id, "page-1");
    assert!(matches!(
        patch.get("Deadline"),
        Some(TypedProperty::Date { date: Some(d) }) if d.start == "2026-05-01"
    ));
    drop(patches);

    // Link the review project, then relay a webhook comment to the record.
    let assets = FakeAssetService {
        comment: Some(AssetComment {
            id: "comment-1".to_string(),
            text: "Love the pacing".to_string(),
            asset_id: "asset-1".to_string(),
            project_id: Some("fio-1".to_string()),
            author: Some("Robin".to_string()),
        }),
    };
    bounded(
        "provision",
        sync::provision_project(&db, None, Some(&assets), &settings, &project.id),
    )
    .await
    .expect("provision");

    let event: sync::WebhookEvent = serde_json::from_value(serde_json::json!({
        "type": "comment.created",
        "resource": {"type": "comment", "id": "comment-1"},
        "project": {"id": "fio-1"}
    }))
    .expect("event");
    let report = bounded(
        "webhook",
        sync::ingest_event(
            &db,
            Some(&remote),
            Some(&assets),
            &settings,
            &event,
            Some("hook-secret"),
        ),
    )
    .await
    .expect("ingest");
    assert!(report.handled);
    let comments = remote.comments.lock().expect("comments");
    assert_eq!(
        comments.as_slice(),
        &[("page-1".to_string(), "Robin: Love the pacing".to_string())]
    );
}

#[tokio::test]
async fn provisioned_project_is_not_duplicated_by_the_next_pull() {
    let db = connect_and_migrate("sqlite::memory:")
        .await
        .expect("test database");
    let settings = portal_settings();
    store::settings::save(&db, &settings).await.expect("save settings");
    let remote = FakeRecordStore::default();
    let assets = FakeAssetService { comment: None };

    let local = store::projects::insert(
        &db,
        store::projects::blank_project("Acme", "Launch Teaser", "15-second cutdown"),
    )
    .await
    .expect("insert");

    let report = bounded(
        "provision",
        sync::provision_project(&db, Some(&remote), Some(&assets), &settings, &local.id),
    )
    .await
    .expect("provision");
    assert!(report.project.external_synced);
    assert!(report.project.asset_synced);

    // The created record comes back on the next pull; it must reconcile
    // into the same local project instead of importing a duplicate.
    let report = bounded("sync", sync::full_sync(&db, &remote, &settings))
        .await
        .expect("sync");
    assert_eq!(report.status, sync::SyncStatus::Completed);
    let all = store::projects::list(&db).await.expect("list");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, local.id);
    assert_eq!(all[0].external_id.as_deref(), Some("page-new"));
}
