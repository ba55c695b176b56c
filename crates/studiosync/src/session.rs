//! Session collaborator seam.
//!
//! The sync engine is role-agnostic; callers of the trigger surface pass
//! through a [`SessionGate`] first. The real portal issues opaque session
//! tokens; here only the contract and a shared-secret gate for headless
//! callers (cron, webhooks) live.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Portal roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Client,
}

/// The validated contents of a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub user_id: String,
    pub role: Role,
    pub name: String,
}

/// Authentication failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing or invalid session token")]
    InvalidToken,

    #[error("role not permitted for this operation")]
    Forbidden,
}

/// Validates a session token and optionally restricts roles.
pub trait SessionGate: Send + Sync {
    /// Validate `token`; when `allowed_roles` is non-empty, the session's
    /// role must be among them.
    fn require_session(
        &self,
        token: &str,
        allowed_roles: &[Role],
    ) -> Result<SessionPayload, AuthError>;
}

/// A gate accepting a single shared secret, standing in for headless
/// callers such as the webhook receiver or a cron trigger.
pub struct TokenGate {
    secret: String,
    payload: SessionPayload,
}

impl TokenGate {
    /// Gate accepting `secret` and yielding an admin session.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            payload: SessionPayload {
                user_id: "system".to_string(),
                role: Role::Admin,
                name: "Automation".to_string(),
            },
        }
    }
}

impl SessionGate for TokenGate {
    fn require_session(
        &self,
        token: &str,
        allowed_roles: &[Role],
    ) -> Result<SessionPayload, AuthError> {
        if token != self.secret {
            return Err(AuthError::InvalidToken);
        }
        if !allowed_roles.is_empty() && !allowed_roles.contains(&self.payload.role) {
            return Err(AuthError::Forbidden);
        }
        Ok(self.payload.clone())
    }
}
