//! Local project store: persistence helpers over the entity layer.

pub mod errors;
pub mod projects;
pub mod settings;

pub use errors::{Result, StoreError};
pub use settings::{PropertyMapping, SyncSettings, TrackedProperty};
