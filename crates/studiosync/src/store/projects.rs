//! Project store operations.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::errors::{Result, StoreError};
use crate::entity::prelude::{Project, ProjectActiveModel, ProjectColumn, ProjectModel};

// Last issued id suffix. Ids derive from a millisecond timestamp, so two
// imports in the same millisecond would collide without this.
static LAST_ID_SUFFIX: AtomicI64 = AtomicI64::new(-1);

/// Generate a fresh local project id, `PRJ-<6 digits>`.
///
/// The digits are the trailing six of the current millisecond timestamp;
/// suffixes advance monotonically within the process so back-to-back
/// imports get distinct ids.
#[must_use]
pub fn generate_project_id() -> String {
    let now = Utc::now().timestamp_millis().rem_euclid(1_000_000);
    let mut candidate = now;
    loop {
        let last = LAST_ID_SUFFIX.load(Ordering::Acquire);
        if candidate <= last && last - candidate < 500_000 {
            candidate = (last + 1).rem_euclid(1_000_000);
        }
        if LAST_ID_SUFFIX
            .compare_exchange(last, candidate, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            return format!("PRJ-{candidate:06}");
        }
    }
}

/// Insert a new project.
pub async fn insert(db: &DatabaseConnection, model: ProjectActiveModel) -> Result<ProjectModel> {
    model.insert(db).await.map_err(StoreError::from)
}

/// Update an existing project.
pub async fn update(db: &DatabaseConnection, model: ProjectActiveModel) -> Result<ProjectModel> {
    model.update(db).await.map_err(StoreError::from)
}

/// Find a project by its local id.
pub async fn find_by_id(db: &DatabaseConnection, id: &str) -> Result<Option<ProjectModel>> {
    Project::find_by_id(id.to_string())
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// Find a project by its local id, erroring when absent.
pub async fn get(db: &DatabaseConnection, id: &str) -> Result<ProjectModel> {
    find_by_id(db, id)
        .await?
        .ok_or_else(|| StoreError::not_found(format!("project {id}")))
}

/// Find the project linked to a record-store page.
pub async fn find_by_external_id(
    db: &DatabaseConnection,
    external_id: &str,
) -> Result<Option<ProjectModel>> {
    Project::find()
        .filter(ProjectColumn::ExternalId.eq(external_id))
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// Find the project linked to an asset-service project.
pub async fn find_by_asset_project_id(
    db: &DatabaseConnection,
    asset_project_id: &str,
) -> Result<Option<ProjectModel>> {
    Project::find()
        .filter(ProjectColumn::AssetProjectId.eq(asset_project_id))
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// List all projects, newest first.
pub async fn list(db: &DatabaseConnection) -> Result<Vec<ProjectModel>> {
    Project::find()
        .order_by_desc(ProjectColumn::CreatedAt)
        .all(db)
        .await
        .map_err(StoreError::from)
}

/// List projects carrying a record-store link - the push candidates.
pub async fn list_linked(db: &DatabaseConnection) -> Result<Vec<ProjectModel>> {
    Project::find()
        .filter(ProjectColumn::ExternalId.is_not_null())
        .order_by_desc(ProjectColumn::CreatedAt)
        .all(db)
        .await
        .map_err(StoreError::from)
}

/// List the projects assigned to a client user, newest first.
pub async fn list_for_client(
    db: &DatabaseConnection,
    client_user_id: &str,
) -> Result<Vec<ProjectModel>> {
    Project::find()
        .filter(ProjectColumn::AssignedTo.eq(client_user_id))
        .order_by_desc(ProjectColumn::CreatedAt)
        .all(db)
        .await
        .map_err(StoreError::from)
}

/// Record the external link on a project. Linking happens at most once;
/// re-linking to a different page is rejected.
pub async fn link_external(
    db: &DatabaseConnection,
    project: &ProjectModel,
    external_id: &str,
    last_edited_at: chrono::DateTime<chrono::FixedOffset>,
) -> Result<ProjectModel> {
    match project.external_id.as_deref() {
        Some(existing) if existing != external_id => {
            return Err(StoreError::invalid_input(format!(
                "project {} is already linked to {existing}",
                project.id
            )));
        }
        _ => {}
    }

    let mut model: ProjectActiveModel = project.clone().into();
    model.external_id = Set(Some(external_id.to_string()));
    model.external_last_edited_at = Set(Some(last_edited_at));
    model.external_synced = Set(true);
    update(db, model).await
}

/// Merge client brief answers into the property bag and mark the brief
/// submitted. Unknown keys merge in as-is; the next pull overwrites any
/// key that is tracked.
pub async fn merge_brief_answers(
    db: &DatabaseConnection,
    id: &str,
    answers: &serde_json::Map<String, serde_json::Value>,
) -> Result<ProjectModel> {
    let project = get(db, id).await?;

    let mut properties = project.properties_map();
    for (key, value) in answers {
        properties.insert(key.clone(), value.clone());
    }

    let mut model: ProjectActiveModel = project.into();
    model.properties = Set(serde_json::Value::Object(properties));
    model.brief_submitted = Set(true);
    model.brief_submitted_at = Set(Some(Utc::now().fixed_offset()));
    update(db, model).await
}

/// Set or clear the client assignment and visibility subset.
pub async fn set_assignment(
    db: &DatabaseConnection,
    id: &str,
    assigned_to: Option<String>,
    client_visibility: Option<Vec<String>>,
) -> Result<ProjectModel> {
    let project = get(db, id).await?;

    let mut model: ProjectActiveModel = project.into();
    model.assigned_to = Set(assigned_to);
    model.client_visibility = Set(client_visibility.map(|keys| serde_json::json!(keys)));
    update(db, model).await
}

/// A blank local project, as created by the admin or client registration.
#[must_use]
pub fn blank_project(
    client_name: &str,
    project_name: &str,
    description: &str,
) -> ProjectActiveModel {
    ProjectActiveModel {
        id: Set(generate_project_id()),
        external_id: Set(None),
        external_last_edited_at: Set(None),
        asset_project_id: Set(None),
        asset_root_id: Set(None),
        client_name: Set(client_name.to_string()),
        project_name: Set(project_name.to_string()),
        description: Set(description.to_string()),
        status: Set("Setup".to_string()),
        properties: Set(serde_json::json!({})),
        external_synced: Set(false),
        asset_synced: Set(false),
        assigned_to: Set(None),
        client_visibility: Set(None),
        brief_submitted: Set(false),
        brief_submitted_at: Set(None),
        created_at: Set(Utc::now().fixed_offset()),
    }
}
