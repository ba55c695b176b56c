//! Pull/push reconciliation against the record store.

use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};

use super::types::{SyncError, SyncReport};
use crate::codec::{self, PropertyKind};
use crate::entity::prelude::{ProjectActiveModel, ProjectModel};
use crate::remote::{PropertyPatch, RecordStore, RemotePage};
use crate::store::{self, SyncSettings, TrackedProperty};

/// Run one full pass: pull remote records into the local store, then push
/// local values back out. Fails closed when the integration is not
/// configured.
#[tracing::instrument(skip_all)]
pub async fn full_sync<R: RecordStore>(
    db: &DatabaseConnection,
    remote: &R,
    settings: &SyncSettings,
) -> Result<SyncReport, SyncError> {
    if !settings.is_configured() {
        tracing::info!("record store not configured, skipping sync");
        return Ok(SyncReport::not_configured());
    }

    let mut report = SyncReport::default();
    report
        .logs
        .push(format!("Full sync started at {}.", Utc::now().to_rfc3339()));

    pull(db, remote, settings, &mut report).await?;
    push(db, remote, settings, &mut report).await?;

    report.logs.push(format!(
        "Full sync finished: {} pulled, {} pushed.",
        report.pulled, report.pushed
    ));
    Ok(report)
}

/// Pull phase: walk the remote collection and reconcile every record into
/// the local store. Never deletes a local project.
pub async fn pull<R: RecordStore>(
    db: &DatabaseConnection,
    remote: &R,
    settings: &SyncSettings,
    report: &mut SyncReport,
) -> Result<(), SyncError> {
    let Some(collection_id) = settings.collection_id.as_deref() else {
        return Ok(());
    };
    let tracked = settings.tracked();

    let mut records = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        match remote.query_page(collection_id, cursor.as_deref()).await {
            Ok(page) => {
                records.extend(page.results);
                match (page.has_more, page.next_cursor) {
                    (true, Some(next)) => cursor = Some(next),
                    _ => break,
                }
            }
            Err(err) => {
                // Records fetched before the failure still reconcile.
                tracing::warn!(%err, "collection query failed");
                report.log_pull(format!(
                    "Collection query failed: {err}. Reconciling the records fetched so far."
                ));
                break;
            }
        }
    }
    report.log_pull(format!(
        "Fetched {} records from the collection.",
        records.len()
    ));

    for record in records {
        reconcile(db, &tracked, &record, report).await?;
    }
    Ok(())
}

async fn reconcile(
    db: &DatabaseConnection,
    tracked: &[TrackedProperty],
    record: &RemotePage,
    report: &mut SyncReport,
) -> Result<(), SyncError> {
    match store::projects::find_by_external_id(db, &record.id).await? {
        None => {
            let created = create_local(db, tracked, record).await?;
            report.pulled += 1;
            report.log_pull(format!(
                "{}: imported \"{}\" from record {}.",
                created.id,
                created.full_title(),
                record.id
            ));
        }
        Some(local) => {
            let newer = local
                .external_last_edited_at
                .is_none_or(|seen| record.last_edited_at > seen);
            if !newer {
                report.log_pull(format!("{}: no remote changes; skipped.", local.id));
                return Ok(());
            }
            let updated = update_local(db, tracked, record, local).await?;
            report.pulled += 1;
            report.log_pull(format!(
                "{}: updated from record {}.",
                updated.id, record.id
            ));
        }
    }
    Ok(())
}

async fn create_local(
    db: &DatabaseConnection,
    tracked: &[TrackedProperty],
    record: &RemotePage,
) -> Result<ProjectModel, SyncError> {
    // The bag carries every tracked key, empty or not, in mapping order.
    let mut bag = serde_json::Map::new();
    for t in tracked {
        let value = record
            .property(&t.name)
            .map(codec::extract_value)
            .unwrap_or_default();
        bag.insert(t.name.clone(), serde_json::Value::String(value));
    }

    let raw_title = tracked
        .iter()
        .find(|t| t.kind == PropertyKind::Title)
        .and_then(|t| bag.get(&t.name))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let (mut client_name, mut project_name) = split_title(&raw_title)
        .unwrap_or_else(|| (raw_title.trim().to_string(), raw_title.trim().to_string()));
    if client_name.is_empty() {
        client_name = "Unknown".to_string();
    }
    if project_name.is_empty() {
        project_name = "Untitled".to_string();
    }

    let status = match bag.get("Status").and_then(|v| v.as_str()) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => "New".to_string(),
    };

    let model = ProjectActiveModel {
        id: Set(store::projects::generate_project_id()),
        external_id: Set(Some(record.id.clone())),
        external_last_edited_at: Set(Some(record.last_edited_at)),
        asset_project_id: Set(None),
        asset_root_id: Set(None),
        client_name: Set(client_name),
        project_name: Set(project_name),
        description: Set(String::new()),
        status: Set(status),
        properties: Set(serde_json::Value::Object(bag)),
        external_synced: Set(true),
        asset_synced: Set(false),
        assigned_to: Set(None),
        client_visibility: Set(None),
        brief_submitted: Set(false),
        brief_submitted_at: Set(None),
        created_at: Set(record
            .created_at
            .unwrap_or_else(|| Utc::now().fixed_offset())),
    };
    Ok(store::projects::insert(db, model).await?)
}

async fn update_local(
    db: &DatabaseConnection,
    tracked: &[TrackedProperty],
    record: &RemotePage,
    local: ProjectModel,
) -> Result<ProjectModel, SyncError> {
    // Only keys present on the remote record overwrite; the rest of the
    // bag (including untracked brief answers) is left alone.
    let mut bag = local.properties_map();
    for t in tracked {
        if let Some(property) = record.property(&t.name) {
            bag.insert(
                t.name.clone(),
                serde_json::Value::String(codec::extract_value(property)),
            );
        }
    }

    let renamed = tracked
        .iter()
        .find(|t| t.kind == PropertyKind::Title)
        .and_then(|t| record.property(&t.name))
        .map(codec::extract_value)
        .and_then(|raw| split_title(&raw));

    let mut model: ProjectActiveModel = local.into();
    model.properties = Set(serde_json::Value::Object(bag));
    model.external_last_edited_at = Set(Some(record.last_edited_at));
    model.external_synced = Set(true);
    if let Some((client_name, project_name)) = renamed {
        model.client_name = Set(client_name);
        model.project_name = Set(project_name);
    }
    Ok(store::projects::update(db, model).await?)
}

/// Push phase: patch every linked project's non-empty tracked values back
/// to its record. Remote failures log per project and never abort the
/// pass.
pub async fn push<R: RecordStore>(
    db: &DatabaseConnection,
    remote: &R,
    settings: &SyncSettings,
    report: &mut SyncReport,
) -> Result<(), SyncError> {
    let tracked = settings.tracked();

    for project in store::projects::list_linked(db).await? {
        let Some(external_id) = project.external_id.clone() else {
            continue;
        };

        let mut patch = PropertyPatch::new();
        for t in &tracked {
            let value = project.property(&t.name);
            if value.is_empty() {
                continue;
            }
            if t.kind == PropertyKind::Number {
                let (coerced, lossy) = codec::lossy_number(&value);
                if lossy {
                    report.log_push(format!(
                        "{}: value {value:?} for \"{}\" is not numeric; writing {coerced}.",
                        project.id, t.name
                    ));
                }
            }
            if let Some(payload) = codec::build_property_payload(t.kind, &value) {
                patch.insert(t.name.clone(), payload);
            }
        }

        if patch.is_empty() {
            report.log_push(format!("{}: nothing to push; skipped.", project.id));
            continue;
        }

        let count = patch.len();
        match remote.patch_page(&external_id, patch).await {
            Ok(_) => {
                report.pushed += 1;
                report.log_push(format!("{}: pushed {count} properties.", project.id));
            }
            Err(err) => {
                tracing::warn!(%err, project = %project.id, "push failed");
                report.log_push(format!("{}: push failed: {err}.", project.id));
            }
        }
    }
    Ok(())
}

/// Split a title of the form `"<client> | <project>"`.
///
/// Returns `None` unless the split yields exactly two segments; a segment
/// that trims to empty falls back to the raw title.
fn split_title(raw: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = raw.split(" | ").collect();
    if parts.len() != 2 {
        return None;
    }
    let client = parts[0].trim();
    let project = parts[1].trim();
    Some((
        if client.is_empty() { raw } else { client }.to_string(),
        if project.is_empty() { raw } else { project }.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, FixedOffset};

    use super::super::types::SyncStatus;
    use super::*;
    use crate::codec::{SelectOption, TextRun, TypedProperty};
    use crate::remote::{QueryPage, RemoteError};
    use crate::store::PropertyMapping;

    #[derive(Default)]
    struct MockRemote {
        /// Query responses in cursor order.
        pages: Vec<Vec<RemotePage>>,
        fail_last_page: bool,
        fail_patch: bool,
        query_calls: AtomicUsize,
        patches: Mutex<Vec<(String, PropertyPatch)>>,
    }

    #[async_trait]
    impl RecordStore for MockRemote {
        async fn query_page(
            &self,
            _collection_id: &str,
            cursor: Option<&str>,
        ) -> crate::remote::Result<QueryPage> {
            self.query_calls.fetch_add(1, Ordering::SeqCst);
            let index: usize = cursor.map(|c| c.parse().expect("cursor")).unwrap_or(0);
            if self.fail_last_page && index + 1 == self.pages.len() {
                return Err(RemoteError::api(500, "backend unavailable"));
            }
            let results = self.pages.get(index).cloned().unwrap_or_default();
            let has_more = index + 1 < self.pages.len();
            Ok(QueryPage {
                results,
                has_more,
                next_cursor: has_more.then(|| (index + 1).to_string()),
            })
        }

        async fn fetch_page(&self, page_id: &str) -> crate::remote::Result<RemotePage> {
            self.pages
                .iter()
                .flatten()
                .find(|p| p.id == page_id)
                .cloned()
                .ok_or_else(|| RemoteError::not_found(page_id))
        }

        async fn create_page(
            &self,
            _collection_id: &str,
            properties: PropertyPatch,
        ) -> crate::remote::Result<RemotePage> {
            Ok(RemotePage {
                id: "created-1".to_string(),
                created_at: None,
                last_edited_at: ts("2026-03-01T00:00:00Z"),
                properties: properties.into_iter().collect(),
            })
        }

        async fn patch_page(
            &self,
            page_id: &str,
            properties: PropertyPatch,
        ) -> crate::remote::Result<RemotePage> {
            if self.fail_patch {
                return Err(RemoteError::api(500, "write refused"));
            }
            self.patches
                .lock()
                .expect("patch log")
                .push((page_id.to_string(), properties.clone()));
            Ok(RemotePage {
                id: page_id.to_string(),
                created_at: None,
                last_edited_at: ts("2026-03-02T00:00:00Z"),
                properties: properties.into_iter().collect(),
            })
        }

        async fn append_comment(&self, _page_id: &str, _body: &str) -> crate::remote::Result<()> {
            Ok(())
        }
    }

    fn ts(s: &str) -> DateTime<FixedOffset> {
        s.parse().expect("timestamp")
    }

    fn title_prop(text: &str) -> TypedProperty {
        TypedProperty::Title {
            title: vec![TextRun {
                plain_text: Some(text.to_string()),
                text: None,
            }],
        }
    }

    fn status_prop(name: &str) -> TypedProperty {
        TypedProperty::Status {
            status: Some(SelectOption {
                name: name.to_string(),
            }),
        }
    }

    fn number_prop(n: f64) -> TypedProperty {
        TypedProperty::Number { number: Some(n) }
    }

    fn page(id: &str, edited: &str, properties: Vec<(&str, TypedProperty)>) -> RemotePage {
        RemotePage {
            id: id.to_string(),
            created_at: Some(ts(edited)),
            last_edited_at: ts(edited),
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    fn mapping(name: &str, kind: &str) -> PropertyMapping {
        PropertyMapping {
            name: name.to_string(),
            kind: kind.to_string(),
            local_alias: name.to_lowercase(),
        }
    }

    fn settings() -> SyncSettings {
        SyncSettings {
            record_store_token: Some("secret".to_string()),
            collection_id: Some("db-1".to_string()),
            asset_service_token: None,
            webhook_secret: None,
            mappings: vec![
                mapping("Project", "title"),
                mapping("Status", "status"),
                mapping("Budget", "number"),
            ],
            sync_interval_secs: 30,
        }
    }

    async fn setup_db() -> DatabaseConnection {
        crate::db::connect_and_migrate("sqlite::memory:")
            .await
            .expect("test db should migrate")
    }

    fn acme_page(edited: &str, status: &str) -> RemotePage {
        page(
            "page-1",
            edited,
            vec![
                ("Project", title_prop("Acme | Promo Video")),
                ("Status", status_prop(status)),
                ("Budget", number_prop(1200.0)),
            ],
        )
    }

    async fn set_local_status(db: &DatabaseConnection, id: &str, status_value: &str) {
        let project = store::projects::get(db, id).await.expect("project");
        let mut bag = project.properties_map();
        bag.insert(
            "Status".to_string(),
            serde_json::Value::String(status_value.to_string()),
        );
        let mut model: ProjectActiveModel = project.into();
        model.properties = Set(serde_json::Value::Object(bag));
        store::projects::update(db, model).await.expect("update");
    }

    fn patch_status(patch: &PropertyPatch) -> Option<&str> {
        match patch.get("Status") {
            Some(TypedProperty::Status {
                status: Some(option),
            }) => Some(option.name.as_str()),
            _ => None,
        }
    }

    #[tokio::test]
    async fn import_creates_local_mirror_from_remote_record() {
        let db = setup_db().await;
        let remote = MockRemote {
            pages: vec![vec![acme_page("2026-03-01T10:00:00Z", "Editing")]],
            ..Default::default()
        };

        let report = full_sync(&db, &remote, &settings()).await.expect("sync");
        assert_eq!(report.status, SyncStatus::Completed);
        assert_eq!(report.pulled, 1);

        let project = store::projects::find_by_external_id(&db, "page-1")
            .await
            .expect("lookup")
            .expect("imported");
        assert!(project.id.starts_with("PRJ-"));
        assert_eq!(project.client_name, "Acme");
        assert_eq!(project.project_name, "Promo Video");
        assert_eq!(project.status, "Editing");
        assert_eq!(project.property("Budget"), "1200");
        assert!(project.external_synced);
        assert_eq!(
            project.external_last_edited_at,
            Some(ts("2026-03-01T10:00:00Z"))
        );
    }

    #[tokio::test]
    async fn pull_is_idempotent_for_unchanged_records() {
        let db = setup_db().await;
        let remote = MockRemote {
            pages: vec![vec![acme_page("2026-03-01T10:00:00Z", "Editing")]],
            ..Default::default()
        };

        let first = full_sync(&db, &remote, &settings()).await.expect("sync");
        assert_eq!(first.pulled, 1);
        let imported = store::projects::find_by_external_id(&db, "page-1")
            .await
            .expect("lookup")
            .expect("imported");

        let second = full_sync(&db, &remote, &settings()).await.expect("resync");
        assert_eq!(second.pulled, 0);
        assert!(second.logs.iter().any(|l| l.contains("skipped")));

        let all = store::projects::list(&db).await.expect("list");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, imported.id);
    }

    #[tokio::test]
    async fn local_edit_pushes_while_pull_skips() {
        let db = setup_db().await;
        let remote = MockRemote {
            pages: vec![vec![acme_page("2026-03-01T10:00:00Z", "Editing")]],
            ..Default::default()
        };
        full_sync(&db, &remote, &settings()).await.expect("import");
        let project = store::projects::find_by_external_id(&db, "page-1")
            .await
            .expect("lookup")
            .expect("imported");

        set_local_status(&db, &project.id, "Color Grading").await;

        let report = full_sync(&db, &remote, &settings()).await.expect("resync");
        assert_eq!(report.pulled, 0);
        assert_eq!(report.pushed, 1);

        let patches = remote.patches.lock().expect("patches");
        let (page_id, patch) = patches.last().expect("a patch");
        assert_eq!(page_id, "page-1");
        assert_eq!(patch_status(patch), Some("Color Grading"));
    }

    #[tokio::test]
    async fn concurrent_edits_resolve_in_favor_of_the_remote() {
        let db = setup_db().await;
        let remote = MockRemote {
            pages: vec![vec![acme_page("2026-03-01T10:00:00Z", "Editing")]],
            ..Default::default()
        };
        full_sync(&db, &remote, &settings()).await.expect("import");
        let project = store::projects::find_by_external_id(&db, "page-1")
            .await
            .expect("lookup")
            .expect("imported");

        set_local_status(&db, &project.id, "Local Edit").await;
        let remote = MockRemote {
            pages: vec![vec![acme_page("2026-03-01T11:00:00Z", "Remote Edit")]],
            ..Default::default()
        };

        let report = full_sync(&db, &remote, &settings()).await.expect("resync");
        assert_eq!(report.pulled, 1);
        assert_eq!(report.pushed, 1);

        // The newer remote value wins locally, and the push echoes it back.
        let project = store::projects::get(&db, &project.id).await.expect("get");
        assert_eq!(project.property("Status"), "Remote Edit");
        let patches = remote.patches.lock().expect("patches");
        assert_eq!(patch_status(&patches.last().expect("a patch").1), Some("Remote Edit"));
    }

    #[tokio::test]
    async fn unconfigured_sync_fails_closed_without_remote_calls() {
        let db = setup_db().await;
        let remote = MockRemote {
            pages: vec![vec![acme_page("2026-03-01T10:00:00Z", "Editing")]],
            ..Default::default()
        };
        let unconfigured = SyncSettings {
            record_store_token: None,
            ..settings()
        };

        let report = full_sync(&db, &remote, &unconfigured)
            .await
            .expect("sync runs");
        assert_eq!(report.status, SyncStatus::NotConfigured);
        assert_eq!(report.pulled + report.pushed, 0);
        assert_eq!(report.logs.len(), 1);
        assert_eq!(remote.query_calls.load(Ordering::SeqCst), 0);
        assert!(store::projects::list(&db).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn older_remote_edits_never_roll_back_local_state() {
        let db = setup_db().await;
        let remote = MockRemote {
            pages: vec![vec![acme_page("2026-03-01T10:00:00Z", "Editing")]],
            ..Default::default()
        };
        full_sync(&db, &remote, &settings()).await.expect("import");

        let stale = MockRemote {
            pages: vec![vec![acme_page("2026-03-01T09:00:00Z", "Stale")]],
            ..Default::default()
        };
        let report = full_sync(&db, &stale, &settings()).await.expect("resync");
        assert_eq!(report.pulled, 0);

        let project = store::projects::find_by_external_id(&db, "page-1")
            .await
            .expect("lookup")
            .expect("imported");
        assert_eq!(project.property("Status"), "Editing");
        assert_eq!(
            project.external_last_edited_at,
            Some(ts("2026-03-01T10:00:00Z"))
        );
    }

    #[tokio::test]
    async fn query_failure_mid_pagination_keeps_earlier_records() {
        let db = setup_db().await;
        let remote = MockRemote {
            pages: vec![
                vec![acme_page("2026-03-01T10:00:00Z", "Editing")],
                vec![page("page-2", "2026-03-01T10:00:00Z", vec![])],
            ],
            fail_last_page: true,
            ..Default::default()
        };

        let report = full_sync(&db, &remote, &settings()).await.expect("sync");
        assert_eq!(report.status, SyncStatus::Completed);
        assert_eq!(report.pulled, 1);
        assert!(report.logs.iter().any(|l| l.contains("query failed")));
        assert!(store::projects::find_by_external_id(&db, "page-1")
            .await
            .expect("lookup")
            .is_some());
    }

    #[tokio::test]
    async fn import_falls_back_to_placeholder_names() {
        let db = setup_db().await;
        let remote = MockRemote {
            pages: vec![vec![
                page(
                    "page-1",
                    "2026-03-01T10:00:00Z",
                    vec![("Status", status_prop("Editing"))],
                ),
                page(
                    "page-2",
                    "2026-03-01T10:00:00Z",
                    vec![("Project", title_prop("Solo"))],
                ),
            ]],
            ..Default::default()
        };

        full_sync(&db, &remote, &settings()).await.expect("sync");

        let untitled = store::projects::find_by_external_id(&db, "page-1")
            .await
            .expect("lookup")
            .expect("imported");
        assert_eq!(untitled.client_name, "Unknown");
        assert_eq!(untitled.project_name, "Untitled");
        assert_eq!(untitled.status, "Editing");

        // A title without the separator lands in both name fields.
        let solo = store::projects::find_by_external_id(&db, "page-2")
            .await
            .expect("lookup")
            .expect("imported");
        assert_eq!(solo.client_name, "Solo");
        assert_eq!(solo.project_name, "Solo");
        assert_eq!(solo.status, "New");
    }

    #[tokio::test]
    async fn push_skips_unlinked_projects_and_empty_patches() {
        let db = setup_db().await;
        store::projects::insert(&db, store::projects::blank_project("Acme", "Draft", ""))
            .await
            .expect("insert unlinked");

        let mut linked = store::projects::blank_project("Acme", "Empty", "");
        linked.external_id = Set(Some("page-9".to_string()));
        store::projects::insert(&db, linked).await.expect("insert");

        let remote = MockRemote::default();
        let report = full_sync(&db, &remote, &settings()).await.expect("sync");
        assert_eq!(report.pushed, 0);
        assert!(remote.patches.lock().expect("patches").is_empty());
        assert!(report.logs.iter().any(|l| l.contains("nothing to push")));
    }

    #[tokio::test]
    async fn push_failure_is_logged_and_does_not_abort() {
        let db = setup_db().await;
        let seed = MockRemote {
            pages: vec![vec![acme_page("2026-03-01T10:00:00Z", "Editing")]],
            ..Default::default()
        };
        full_sync(&db, &seed, &settings()).await.expect("import");

        let remote = MockRemote {
            pages: vec![vec![acme_page("2026-03-01T10:00:00Z", "Editing")]],
            fail_patch: true,
            ..Default::default()
        };
        let report = full_sync(&db, &remote, &settings()).await.expect("sync");
        assert_eq!(report.status, SyncStatus::Completed);
        assert_eq!(report.pushed, 0);
        assert!(report.logs.iter().any(|l| l.contains("push failed")));
    }

    #[tokio::test]
    async fn unparseable_numbers_push_as_zero_with_a_log_line() {
        let db = setup_db().await;
        let mut linked = store::projects::blank_project("Acme", "Promo", "");
        linked.external_id = Set(Some("page-1".to_string()));
        linked.properties = Set(serde_json::json!({"Budget": "lots"}));
        store::projects::insert(&db, linked).await.expect("insert");

        let remote = MockRemote::default();
        let report = full_sync(&db, &remote, &settings()).await.expect("sync");
        assert_eq!(report.pushed, 1);
        assert!(report.logs.iter().any(|l| l.contains("not numeric")));

        let patches = remote.patches.lock().expect("patches");
        let (_, patch) = patches.last().expect("a patch");
        assert_eq!(
            patch.get("Budget"),
            Some(&TypedProperty::Number { number: Some(0.0) })
        );
    }

    #[test]
    fn split_title_requires_exactly_two_segments() {
        assert_eq!(
            split_title("Acme | Promo"),
            Some(("Acme".to_string(), "Promo".to_string()))
        );
        assert_eq!(
            split_title("  Acme  |  Promo  "),
            Some(("Acme".to_string(), "Promo".to_string()))
        );
        assert_eq!(split_title("Acme"), None);
        assert_eq!(split_title("A | B | C"), None);
        assert_eq!(
            split_title(" | Promo"),
            Some((" | Promo".to_string(), "Promo".to_string()))
        );
    }
}
