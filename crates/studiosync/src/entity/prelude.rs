//! Re-exports of entity types under unambiguous names.

pub use super::project::{
    ActiveModel as ProjectActiveModel, Column as ProjectColumn, Entity as Project,
    Model as ProjectModel,
};
pub use super::sync_settings::{
    ActiveModel as SyncSettingsActiveModel, Column as SyncSettingsColumn, Entity as SyncSettings,
    Model as SyncSettingsModel, SETTINGS_ROW_ID,
};
