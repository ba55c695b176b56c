//! Configuration store: the admin-supplied integration mapping.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::{Deserialize, Serialize};

use super::errors::Result;
use crate::codec::PropertyKind;
use crate::entity::prelude::{SyncSettings as SyncSettingsEntity, SyncSettingsActiveModel,
    SETTINGS_ROW_ID};

/// Default background poll interval in seconds.
pub const DEFAULT_SYNC_INTERVAL_SECS: i64 = 30;

/// Minimum background poll interval in seconds.
pub const MIN_SYNC_INTERVAL_SECS: i64 = 10;

/// One admin-configured property mapping as persisted.
///
/// `kind` is kept as the raw wire name so a mapping saved before a kind
/// was supported (or after one is dropped) survives round-trips; it is
/// filtered out of the tracked set instead of failing the load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyMapping {
    /// External property name.
    pub name: String,
    /// External property kind (wire name).
    pub kind: String,
    /// Local alias shown in the portal.
    #[serde(default)]
    pub local_alias: String,
}

impl PropertyMapping {
    /// The parsed kind, if supported.
    #[must_use]
    pub fn kind(&self) -> Option<PropertyKind> {
        PropertyKind::parse(&self.kind)
    }
}

/// A mapping whose kind is supported; the unit of work for the codec and
/// the sync engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedProperty {
    pub name: String,
    pub kind: PropertyKind,
    pub local_alias: String,
}

/// Domain view of the single settings row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncSettings {
    pub record_store_token: Option<String>,
    pub collection_id: Option<String>,
    pub asset_service_token: Option<String>,
    pub webhook_secret: Option<String>,
    pub mappings: Vec<PropertyMapping>,
    pub sync_interval_secs: i64,
}

impl SyncSettings {
    /// Whether the record-store integration can sync: token and collection
    /// are both present and non-empty.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        non_empty(&self.record_store_token) && non_empty(&self.collection_id)
    }

    /// Whether the asset-service integration is configured.
    #[must_use]
    pub fn asset_configured(&self) -> bool {
        non_empty(&self.asset_service_token)
    }

    /// The tracked-property set: mappings whose kind is supported, in
    /// admin-configured order. This order is the order of the local
    /// property bag.
    #[must_use]
    pub fn tracked(&self) -> Vec<TrackedProperty> {
        self.mappings
            .iter()
            .filter_map(|m| {
                m.kind().map(|kind| TrackedProperty {
                    name: m.name.clone(),
                    kind,
                    local_alias: m.local_alias.clone(),
                })
            })
            .collect()
    }

    /// The mapped title property, if any. Drives client/project name
    /// derivation.
    #[must_use]
    pub fn title_property(&self) -> Option<TrackedProperty> {
        self.tracked()
            .into_iter()
            .find(|t| t.kind == PropertyKind::Title)
    }

    /// Poll interval, clamped to the minimum.
    #[must_use]
    pub fn interval(&self) -> std::time::Duration {
        let secs = if self.sync_interval_secs <= 0 {
            DEFAULT_SYNC_INTERVAL_SECS
        } else {
            self.sync_interval_secs.max(MIN_SYNC_INTERVAL_SECS)
        };
        std::time::Duration::from_secs(secs as u64)
    }
}

/// Load the settings row, or defaults when none has been saved yet.
///
/// A malformed `tracked_properties` column reads as an empty mapping list
/// rather than failing the load.
pub async fn load(db: &DatabaseConnection) -> Result<SyncSettings> {
    let row = SyncSettingsEntity::find_by_id(SETTINGS_ROW_ID).one(db).await?;

    let Some(row) = row else {
        return Ok(SyncSettings {
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            ..SyncSettings::default()
        });
    };

    let mappings: Vec<PropertyMapping> =
        serde_json::from_value(row.tracked_properties.clone()).unwrap_or_else(|e| {
            tracing::warn!("malformed tracked_properties, treating as empty: {e}");
            Vec::new()
        });

    Ok(SyncSettings {
        record_store_token: row.record_store_token,
        collection_id: row.collection_id,
        asset_service_token: row.asset_service_token,
        webhook_secret: row.webhook_secret,
        mappings,
        sync_interval_secs: row.sync_interval_secs,
    })
}

/// Persist the settings as the single row, replacing any previous value.
pub async fn save(db: &DatabaseConnection, settings: &SyncSettings) -> Result<()> {
    let tracked_properties = serde_json::to_value(&settings.mappings)
        .unwrap_or_else(|_| serde_json::Value::Array(Vec::new()));

    let model = SyncSettingsActiveModel {
        id: Set(SETTINGS_ROW_ID),
        record_store_token: Set(settings.record_store_token.clone()),
        collection_id: Set(settings.collection_id.clone()),
        asset_service_token: Set(settings.asset_service_token.clone()),
        webhook_secret: Set(settings.webhook_secret.clone()),
        tracked_properties: Set(tracked_properties),
        sync_interval_secs: Set(settings.sync_interval_secs),
        updated_at: Set(Utc::now().fixed_offset()),
    };

    let exists = SyncSettingsEntity::find_by_id(SETTINGS_ROW_ID)
        .one(db)
        .await?
        .is_some();
    if exists {
        model.update(db).await?;
    } else {
        model.insert(db).await?;
    }

    Ok(())
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(name: &str, kind: &str) -> PropertyMapping {
        PropertyMapping {
            name: name.to_string(),
            kind: kind.to_string(),
            local_alias: name.to_lowercase(),
        }
    }

    fn configured() -> SyncSettings {
        SyncSettings {
            record_store_token: Some("secret".to_string()),
            collection_id: Some("db-1".to_string()),
            asset_service_token: None,
            webhook_secret: None,
            mappings: vec![
                mapping("Project", "title"),
                mapping("Status", "status"),
                mapping("Files", "files"),
                mapping("Budget", "number"),
            ],
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
        }
    }

    #[test]
    fn is_configured_requires_token_and_collection() {
        let mut settings = configured();
        assert!(settings.is_configured());

        settings.collection_id = Some(String::new());
        assert!(!settings.is_configured());

        settings.collection_id = None;
        assert!(!settings.is_configured());
    }

    #[test]
    fn tracked_drops_unsupported_kinds_and_keeps_order() {
        let settings = configured();
        let tracked = settings.tracked();
        let names: Vec<_> = tracked.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Project", "Status", "Budget"]);
    }

    #[test]
    fn title_property_finds_the_mapped_title() {
        let settings = configured();
        let title = settings.title_property().expect("title mapped");
        assert_eq!(title.name, "Project");
    }

    #[test]
    fn interval_is_clamped_and_defaulted() {
        let mut settings = configured();
        assert_eq!(settings.interval().as_secs(), 30);

        settings.sync_interval_secs = 3;
        assert_eq!(settings.interval().as_secs(), 10);

        settings.sync_interval_secs = 0;
        assert_eq!(settings.interval().as_secs(), 30);

        settings.sync_interval_secs = 120;
        assert_eq!(settings.interval().as_secs(), 120);
    }

    #[tokio::test]
    async fn load_defaults_then_round_trips() {
        let db = crate::db::connect_and_migrate("sqlite::memory:")
            .await
            .expect("test db");

        let initial = load(&db).await.expect("load defaults");
        assert!(!initial.is_configured());
        assert_eq!(initial.sync_interval_secs, DEFAULT_SYNC_INTERVAL_SECS);

        let settings = configured();
        save(&db, &settings).await.expect("save settings");
        let loaded = load(&db).await.expect("reload");
        assert_eq!(loaded, settings);

        // Saving again updates in place.
        let mut changed = settings.clone();
        changed.sync_interval_secs = 45;
        save(&db, &changed).await.expect("resave");
        assert_eq!(load(&db).await.expect("reload").sync_interval_secs, 45);
    }
}
