//! Bidirectional reconciliation between the local project store and the
//! external record store.
//!
//! One full pass is pull (external → local) then push (local → external),
//! in that fixed order: the record store is the source of truth for field
//! content, so remote edits land first and local values go out second.
//! Note the narrow race this leaves open - a remote edit made between the
//! pull read and the push write, carrying the same edit timestamp, can be
//! overwritten by the push. The original system has the same gap.

pub mod engine;
pub mod poller;
pub mod provision;
pub mod types;
pub mod webhook;

pub use engine::{full_sync, pull, push};
pub use poller::run_poller;
pub use provision::provision_project;
pub use types::{ProvisionReport, SyncError, SyncReport, SyncStatus, WebhookReport};
pub use webhook::{ingest_event, WebhookEvent};
