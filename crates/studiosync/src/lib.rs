//! StudioSync - the sync engine behind a freelance studio's project portal.
//!
//! The local SQLite store mirrors one project per client engagement.
//! Projects link outward to two services: a record-store page (the
//! operational source of truth for project fields) and an asset-review
//! project (where clients watch cuts and leave comments). This crate owns
//! the data model, the typed property codec, the HTTP clients, and the
//! reconciliation engine tying them together.
//!
//! # Features
//!
//! - `migrate` - Enables database migration support. When enabled, you can
//!   use [`connect_and_migrate`] to automatically run migrations on
//!   connection.
//!
//! # Example
//!
//! ```ignore
//! use studiosync::{connect_and_migrate, store, sync};
//!
//! let db = connect_and_migrate("sqlite://studiosync.db?mode=rwc").await?;
//!
//! let settings = store::settings::load(&db).await?;
//! let client = studiosync::notion::NotionClient::new(token)?;
//! let report = sync::full_sync(&db, &client, &settings).await?;
//! ```

pub mod asset;
pub mod codec;
pub mod db;
pub mod entity;
pub mod frameio;
pub mod notion;
pub mod rate_limit;
pub mod remote;
pub mod retry;
pub mod session;
pub mod store;
pub mod sync;

#[cfg(feature = "migrate")]
pub mod migration;

pub use asset::{AssetService, AssetServiceError};
pub use codec::{PropertyKind, TypedProperty};
pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use rate_limit::{rate_limits, ApiRateLimiter};
pub use remote::{PropertyPatch, RecordStore, RemoteError, RemotePage};
pub use store::StoreError;
