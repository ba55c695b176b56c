//! SyncSettings entity - the admin-configured integration mapping.
//!
//! A single-row table (id is always [`SETTINGS_ROW_ID`]): credentials for
//! both integrations, the selected collection, the tracked property
//! mappings, and the poll interval. Raw API credentials are stored in
//! plaintext; this is a single-operator deployment.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Primary key of the one and only settings row.
pub const SETTINGS_ROW_ID: i32 = 1;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sync_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,

    /// Record-store API token.
    #[sea_orm(nullable)]
    pub record_store_token: Option<String>,
    /// Id of the selected record-store collection (database).
    #[sea_orm(nullable)]
    pub collection_id: Option<String>,
    /// Asset-review-service API token.
    #[sea_orm(nullable)]
    pub asset_service_token: Option<String>,
    /// Shared secret expected on inbound webhook calls.
    #[sea_orm(nullable)]
    pub webhook_secret: Option<String>,

    /// Tracked property mappings as a JSON array of
    /// `{ name, kind, local_alias }` objects.
    #[sea_orm(column_type = "Json")]
    pub tracked_properties: Json,

    /// Background poll interval in seconds. Clamped to a minimum of 10 on
    /// read; defaults to 30.
    pub sync_interval_secs: i64,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
