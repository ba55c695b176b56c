//! Initial migration creating the projects and sync_settings tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_projects(manager).await?;
        self.create_sync_settings(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SyncSettings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_projects(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Projects::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    // External links
                    .col(ColumnDef::new(Projects::ExternalId).string().null())
                    .col(
                        ColumnDef::new(Projects::ExternalLastEditedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Projects::AssetProjectId).string().null())
                    .col(ColumnDef::new(Projects::AssetRootId).string().null())
                    // Display
                    .col(ColumnDef::new(Projects::ClientName).string().not_null())
                    .col(ColumnDef::new(Projects::ProjectName).string().not_null())
                    .col(
                        ColumnDef::new(Projects::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Projects::Status)
                            .string()
                            .not_null()
                            .default("Setup"),
                    )
                    // Property bag
                    .col(
                        ColumnDef::new(Projects::Properties)
                            .json()
                            .not_null()
                            .default(Expr::cust("'{}'")),
                    )
                    // Sync state
                    .col(
                        ColumnDef::new(Projects::ExternalSynced)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Projects::AssetSynced)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    // Portal scoping
                    .col(ColumnDef::new(Projects::AssignedTo).string().null())
                    .col(ColumnDef::new(Projects::ClientVisibility).json().null())
                    // Intake
                    .col(
                        ColumnDef::new(Projects::BriefSubmitted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Projects::BriefSubmittedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Projects::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index on external_id: a record-store page links to at most
        // one local project.
        manager
            .create_index(
                Index::create()
                    .name("idx_projects_external_id")
                    .table(Projects::Table)
                    .col(Projects::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Lookup index for webhook matching by asset-service project id.
        manager
            .create_index(
                Index::create()
                    .name("idx_projects_asset_project_id")
                    .table(Projects::Table)
                    .col(Projects::AssetProjectId)
                    .to_owned(),
            )
            .await?;

        // Portal listings filter by assignment.
        manager
            .create_index(
                Index::create()
                    .name("idx_projects_assigned_to")
                    .table(Projects::Table)
                    .col(Projects::AssignedTo)
                    .to_owned(),
            )
            .await?;

        // Newest-first listing order.
        manager
            .create_index(
                Index::create()
                    .name("idx_projects_created_at")
                    .table(Projects::Table)
                    .col((Projects::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_sync_settings(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SyncSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SyncSettings::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SyncSettings::RecordStoreToken)
                            .string()
                            .null(),
                    )
                    .col(ColumnDef::new(SyncSettings::CollectionId).string().null())
                    .col(
                        ColumnDef::new(SyncSettings::AssetServiceToken)
                            .string()
                            .null(),
                    )
                    .col(ColumnDef::new(SyncSettings::WebhookSecret).string().null())
                    .col(
                        ColumnDef::new(SyncSettings::TrackedProperties)
                            .json()
                            .not_null()
                            .default(Expr::cust("'[]'")),
                    )
                    .col(
                        ColumnDef::new(SyncSettings::SyncIntervalSecs)
                            .big_integer()
                            .not_null()
                            .default(30),
                    )
                    .col(
                        ColumnDef::new(SyncSettings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Projects {
    Table,
    Id,
    ExternalId,
    ExternalLastEditedAt,
    AssetProjectId,
    AssetRootId,
    ClientName,
    ProjectName,
    Description,
    Status,
    Properties,
    ExternalSynced,
    AssetSynced,
    AssignedTo,
    ClientVisibility,
    BriefSubmitted,
    BriefSubmittedAt,
    CreatedAt,
}

#[derive(Iden)]
enum SyncSettings {
    Table,
    Id,
    RecordStoreToken,
    CollectionId,
    AssetServiceToken,
    WebhookSecret,
    TrackedProperties,
    SyncIntervalSecs,
    UpdatedAt,
}
