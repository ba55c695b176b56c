//! Database entities for the local project store.

pub mod prelude;
pub mod project;
pub mod sync_settings;
