//! Inbound asset-service webhook events.
//!
//! The only event with a side effect is `comment.created`: the comment is
//! fetched from the asset service, matched to a local project through its
//! review-project id, and relayed into the linked record's comment
//! thread. Every other event type is acknowledged and dropped.

use sea_orm::DatabaseConnection;
use serde::Deserialize;

use super::types::{SyncError, WebhookReport};
use crate::asset::AssetService;
use crate::remote::RecordStore;
use crate::session::{Role, SessionGate, TokenGate};
use crate::store::{self, SyncSettings};

/// Event type with a relay side effect.
pub const EVENT_COMMENT_CREATED: &str = "comment.created";

/// An inbound webhook event, as posted by the asset service.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub resource: WebhookResource,
    /// Review project the event happened in, when the service includes it.
    #[serde(default)]
    pub project: Option<WebhookProject>,
}

/// The resource an event refers to.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookResource {
    pub id: String,
    #[serde(rename = "type", default)]
    pub resource_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookProject {
    pub id: String,
}

/// Process one webhook event.
///
/// `provided_secret` is the caller's shared-secret credential; when a
/// webhook secret is configured, a missing or wrong one rejects the event
/// without touching either service. Relay failures log and acknowledge
/// rather than erroring, so the sender does not retry a poison event.
#[tracing::instrument(skip_all, fields(event_type = %event.event_type))]
pub async fn ingest_event(
    db: &DatabaseConnection,
    remote: Option<&dyn RecordStore>,
    assets: Option<&dyn AssetService>,
    settings: &SyncSettings,
    event: &WebhookEvent,
    provided_secret: Option<&str>,
) -> Result<WebhookReport, SyncError> {
    let mut report = WebhookReport::default();

    if let Some(secret) = settings.webhook_secret.as_deref().filter(|s| !s.is_empty()) {
        let gate = TokenGate::new(secret);
        if gate
            .require_session(provided_secret.unwrap_or_default(), &[Role::Admin])
            .is_err()
        {
            tracing::warn!("webhook event rejected: bad secret");
            report.logs.push("Event rejected: invalid secret.".to_string());
            return Ok(report);
        }
    }

    if event.event_type != EVENT_COMMENT_CREATED {
        report.logs.push(format!(
            "Acknowledged \"{}\" event without action.",
            event.event_type
        ));
        return Ok(report);
    }

    let Some(assets) = assets else {
        report
            .logs
            .push("Asset service not configured; comment not relayed.".to_string());
        return Ok(report);
    };

    let comment = match assets.fetch_comment(&event.resource.id).await {
        Ok(comment) => comment,
        Err(err) => {
            tracing::warn!(%err, comment = %event.resource.id, "comment fetch failed");
            report
                .logs
                .push(format!("Could not fetch comment {}: {err}.", event.resource.id));
            return Ok(report);
        }
    };

    // The comment payload names its review project; the event envelope is
    // the fallback.
    let review_project_id = comment
        .project_id
        .clone()
        .or_else(|| event.project.as_ref().map(|p| p.id.clone()));
    let Some(review_project_id) = review_project_id else {
        report
            .logs
            .push(format!("Comment {} has no review project; dropped.", comment.id));
        return Ok(report);
    };

    let Some(project) = store::projects::find_by_asset_project_id(db, &review_project_id).await?
    else {
        report.logs.push(format!(
            "No local project for review project {review_project_id}; dropped."
        ));
        return Ok(report);
    };

    let Some(external_id) = project.external_id.as_deref() else {
        report.logs.push(format!(
            "{}: no linked record; comment not relayed.",
            project.id
        ));
        return Ok(report);
    };
    let Some(remote) = remote.filter(|_| settings.is_configured()) else {
        report
            .logs
            .push("Record store not configured; comment not relayed.".to_string());
        return Ok(report);
    };

    let body = match comment.author.as_deref() {
        Some(author) if !author.is_empty() => format!("{author}: {}", comment.text),
        _ => comment.text.clone(),
    };
    match remote.append_comment(external_id, &body).await {
        Ok(()) => {
            report.handled = true;
            report.logs.push(format!(
                "{}: relayed comment {} to record {external_id}.",
                project.id, comment.id
            ));
        }
        Err(err) => {
            tracing::warn!(%err, project = %project.id, "comment relay failed");
            report
                .logs
                .push(format!("{}: comment relay failed: {err}.", project.id));
        }
    }
    Ok(report)
}
