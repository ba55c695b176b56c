//! Project entity - the local mirror of one client engagement.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Project model. One row per studio project, optionally linked to a
/// record-store page and an asset-review-service project.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    /// Locally generated identifier, `PRJ-<6 digits>`. Stable for the
    /// project's lifetime.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    // ─── External Links ──────────────────────────────────────────────────────
    /// Id of the linked record-store page. Set at most once; never re-linked.
    #[sea_orm(unique, nullable)]
    pub external_id: Option<String>,
    /// Last external edit observed locally. Monotonically non-decreasing
    /// under pull.
    pub external_last_edited_at: Option<DateTimeWithTimeZone>,
    /// Id of the linked asset-review-service project.
    #[sea_orm(nullable)]
    pub asset_project_id: Option<String>,
    /// Root asset id of the linked asset-review-service project, parent of
    /// the standard uploads folder.
    #[sea_orm(nullable)]
    pub asset_root_id: Option<String>,

    // ─── Display ─────────────────────────────────────────────────────────────
    /// Client segment of the mapped title property (`"A | B"` → `"A"`).
    pub client_name: String,
    /// Project segment of the mapped title property (`"A | B"` → `"B"`).
    pub project_name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// Free-text workflow state.
    pub status: String,

    // ─── Property Bag ────────────────────────────────────────────────────────
    /// Ordered map of tracked external-property-name → extracted string
    /// value. Keys follow the tracked set as of the last sync; values may
    /// be empty strings.
    #[sea_orm(column_type = "Json")]
    pub properties: Json,

    // ─── Sync State ──────────────────────────────────────────────────────────
    /// Whether the record store holds a counterpart for this project.
    #[sea_orm(default_value = false)]
    pub external_synced: bool,
    /// Whether the asset-review service holds a counterpart.
    #[sea_orm(default_value = false)]
    pub asset_synced: bool,

    // ─── Portal Scoping ──────────────────────────────────────────────────────
    /// Client-user id this project is visible to, if any.
    #[sea_orm(nullable)]
    pub assigned_to: Option<String>,
    /// Subset of property keys visible to the assigned client (JSON array
    /// of strings). Unset means all keys.
    #[sea_orm(column_type = "Json", nullable)]
    pub client_visibility: Option<Json>,

    // ─── Intake ──────────────────────────────────────────────────────────────
    #[sea_orm(default_value = false)]
    pub brief_submitted: bool,
    pub brief_submitted_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The property bag as a map. A malformed column value (anything other
    /// than a JSON object) reads as empty rather than failing the caller.
    pub fn properties_map(&self) -> serde_json::Map<String, serde_json::Value> {
        self.properties.as_object().cloned().unwrap_or_default()
    }

    /// String value of one tracked property, or `""` if absent.
    pub fn property(&self, name: &str) -> String {
        self.properties
            .get(name)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    /// The properties visible to the assigned client: all of them unless
    /// `client_visibility` narrows the set.
    pub fn visible_properties(&self) -> serde_json::Map<String, serde_json::Value> {
        let all = self.properties_map();
        match self.visibility_keys() {
            None => all,
            Some(keys) => all
                .into_iter()
                .filter(|(name, _)| keys.iter().any(|k| k == name))
                .collect(),
        }
    }

    /// Whether the given client user may see this project at all.
    pub fn visible_to(&self, client_user_id: &str) -> bool {
        self.assigned_to.as_deref() == Some(client_user_id)
    }

    /// Combined display title, `"<client> | <project>"`.
    pub fn full_title(&self) -> String {
        format!("{} | {}", self.client_name, self.project_name)
    }

    fn visibility_keys(&self) -> Option<Vec<String>> {
        let raw = self.client_visibility.as_ref()?;
        let keys = raw.as_array()?;
        Some(
            keys.iter()
                .filter_map(|k| k.as_str().map(str::to_string))
                .collect(),
        )
    }
}
