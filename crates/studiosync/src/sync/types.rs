//! Result and report types for sync operations.

use thiserror::Error;

use crate::entity::prelude::ProjectModel;
use crate::store::StoreError;

/// Outcome class of a full sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStatus {
    /// The pass ran to completion (individual records may still have
    /// logged failures).
    #[default]
    Completed,
    /// Credentials or collection id were missing; nothing was attempted.
    NotConfigured,
}

/// Result of a full sync pass: counts plus the chronological log the
/// admin UI renders.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub status: SyncStatus,
    /// Records created or updated locally by the pull phase.
    pub pulled: usize,
    /// Records patched remotely by the push phase.
    pub pushed: usize,
    pub logs: Vec<String>,
}

impl SyncReport {
    /// The fail-closed result for incomplete configuration.
    #[must_use]
    pub fn not_configured() -> Self {
        Self {
            status: SyncStatus::NotConfigured,
            pulled: 0,
            pushed: 0,
            logs: vec!["Sync aborted: record store not configured.".to_string()],
        }
    }

    pub(crate) fn log_pull(&mut self, message: impl std::fmt::Display) {
        self.logs.push(format!("[PULL] {message}"));
    }

    pub(crate) fn log_push(&mut self, message: impl std::fmt::Display) {
        self.logs.push(format!("[PUSH] {message}"));
    }
}

/// Result of provisioning one project against the external services.
#[derive(Debug)]
pub struct ProvisionReport {
    pub logs: Vec<String>,
    /// The project after provisioning, possibly partially updated.
    pub project: ProjectModel,
}

/// Result of ingesting one inbound webhook event.
#[derive(Debug, Default)]
pub struct WebhookReport {
    /// Whether the event resulted in a remote write.
    pub handled: bool,
    pub logs: Vec<String>,
}

/// Fatal sync failures. Remote-service errors are recovered per record
/// and surfaced through the report log instead; only local-store failures
/// abort a pass.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),
}
