//! Project provisioning: create the external counterparts for one local
//! project.
//!
//! Each integration is attempted independently, so a failure on one side
//! still leaves the other linked. Both links are set at most once;
//! provisioning an already-linked side skips it.

use sea_orm::Set;
use sea_orm::DatabaseConnection;

use super::types::{ProvisionReport, SyncError};
use crate::asset::AssetService;
use crate::codec::{self, PropertyKind};
use crate::entity::prelude::{ProjectActiveModel, ProjectModel};
use crate::remote::{PropertyPatch, RecordStore};
use crate::store::{self, SyncSettings};

/// Provision the asset-review project and the record-store page for one
/// local project. Pass `None` for an integration that is not configured.
#[tracing::instrument(skip_all, fields(project_id))]
pub async fn provision_project(
    db: &DatabaseConnection,
    remote: Option<&dyn RecordStore>,
    assets: Option<&dyn AssetService>,
    settings: &SyncSettings,
    project_id: &str,
) -> Result<ProvisionReport, SyncError> {
    let mut logs = Vec::new();
    let mut project = store::projects::get(db, project_id).await?;

    project = provision_assets(db, assets, project, &mut logs).await?;
    project = provision_record(db, remote, settings, project, &mut logs).await?;

    Ok(ProvisionReport { logs, project })
}

async fn provision_assets(
    db: &DatabaseConnection,
    assets: Option<&dyn AssetService>,
    project: ProjectModel,
    logs: &mut Vec<String>,
) -> Result<ProjectModel, SyncError> {
    if project.asset_synced {
        logs.push(format!(
            "{}: asset project already provisioned; skipped.",
            project.id
        ));
        return Ok(project);
    }
    let Some(assets) = assets else {
        logs.push(format!(
            "{}: asset service not configured; skipped.",
            project.id
        ));
        return Ok(project);
    };

    match assets.create_project(&project.full_title()).await {
        Ok(created) => {
            logs.push(format!(
                "{}: created asset project {} (\"{}\").",
                project.id, created.id, created.name
            ));

            // The standard client-facing dropbox under the project root.
            let uploads = format!("Uploads - {}", project.client_name);
            match assets.create_folder(&created.root_asset_id, &uploads).await {
                Ok(folder) => logs.push(format!(
                    "{}: created folder \"{uploads}\" ({}).",
                    project.id, folder.id
                )),
                Err(err) => {
                    tracing::warn!(%err, project = %project.id, "uploads folder creation failed");
                    logs.push(format!(
                        "{}: could not create the uploads folder: {err}.",
                        project.id
                    ));
                }
            }

            let mut model: ProjectActiveModel = project.into();
            model.asset_project_id = Set(Some(created.id));
            model.asset_root_id = Set(Some(created.root_asset_id));
            model.asset_synced = Set(true);
            Ok(store::projects::update(db, model).await?)
        }
        Err(err) => {
            tracing::warn!(%err, project = %project.id, "asset project creation failed");
            logs.push(format!(
                "{}: asset project creation failed: {err}.",
                project.id
            ));
            Ok(project)
        }
    }
}

async fn provision_record(
    db: &DatabaseConnection,
    remote: Option<&dyn RecordStore>,
    settings: &SyncSettings,
    project: ProjectModel,
    logs: &mut Vec<String>,
) -> Result<ProjectModel, SyncError> {
    if project.external_synced {
        logs.push(format!(
            "{}: record already provisioned; skipped.",
            project.id
        ));
        return Ok(project);
    }
    let (Some(remote), true) = (remote, settings.is_configured()) else {
        logs.push(format!(
            "{}: record store not configured; skipped.",
            project.id
        ));
        return Ok(project);
    };
    let collection_id = settings.collection_id.as_deref().unwrap_or_default();

    let patch = initial_patch(settings, &project);
    match remote.create_page(collection_id, patch).await {
        Ok(created) => {
            logs.push(format!(
                "{}: created record {} in the collection.",
                project.id, created.id
            ));
            Ok(store::projects::link_external(db, &project, &created.id, created.last_edited_at)
                .await?)
        }
        Err(err) => {
            tracing::warn!(%err, project = %project.id, "record creation failed");
            logs.push(format!("{}: record creation failed: {err}.", project.id));
            Ok(project)
        }
    }
}

/// Build the create payload from the tracked set. The title property gets
/// the combined display title; status and description columns seed their
/// mapped properties when the bag has no value yet.
fn initial_patch(settings: &SyncSettings, project: &ProjectModel) -> PropertyPatch {
    let mut patch = PropertyPatch::new();
    for t in settings.tracked() {
        let value = match t.kind {
            PropertyKind::Title => project.full_title(),
            _ => {
                let bag_value = project.property(&t.name);
                if !bag_value.is_empty() {
                    bag_value
                } else {
                    match t.kind {
                        PropertyKind::Status => project.status.clone(),
                        PropertyKind::RichText => project.description.clone(),
                        _ => bag_value,
                    }
                }
            }
        };
        if let Some(payload) = codec::build_property_payload(t.kind, &value) {
            patch.insert(t.name, payload);
        }
    }
    patch
}
