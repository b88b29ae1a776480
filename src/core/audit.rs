//! Audit trail for mutation attempts
//!
//! Every create/update/delete attempt produces exactly one [`AuditEntry`],
//! whatever its outcome. Delivery to the activity-log endpoint is best
//! effort: a failed write is logged and dropped, never retried and never
//! shown to the user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

use crate::core::gateway::ApiGateway;

/// Kind of mutation being audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::Create => write!(f, "Create"),
            AuditAction::Update => write!(f, "Update"),
            AuditAction::Delete => write!(f, "Delete"),
        }
    }
}

/// One recorded mutation attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub actor: String,
    pub action: AuditAction,
    pub success: bool,
    pub origin: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Wire body of `POST /activity-log`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityPayload {
    pub username: String,
    pub action: AuditAction,
    pub is_success: bool,
    pub os: String,
    pub message: String,
}

impl From<&AuditEntry> for ActivityPayload {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            username: entry.actor.clone(),
            action: entry.action,
            is_success: entry.success,
            os: entry.origin.clone(),
            message: entry.message.clone(),
        }
    }
}

/// `"<server message> (<code>)"`, used for Create and Delete
pub fn describe_single(server_message: &str, code: &str) -> String {
    format!("{} ({})", server_message, code)
}

/// `"<server message> (<old code> ⮕ <new code>)"`, used for Update
pub fn describe_change(server_message: &str, old_code: &str, new_code: &str) -> String {
    format!("{} ({} ⮕ {})", server_message, old_code, new_code)
}

/// Best-effort recorder bound to one actor
#[derive(Clone)]
pub struct AuditLogger {
    gateway: Rc<dyn ApiGateway>,
    actor: String,
    origin: String,
}

impl AuditLogger {
    /// Logger whose origin is the host operating system
    pub fn new(gateway: Rc<dyn ApiGateway>, actor: &str) -> Self {
        Self {
            gateway,
            actor: actor.to_string(),
            origin: std::env::consts::OS.to_string(),
        }
    }

    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = origin.to_string();
        self
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Record one attempt and return the entry that was produced
    ///
    /// The activity-log call is awaited so that ordering relative to the
    /// caller's next step is fixed, but its failure is swallowed.
    pub async fn record(&self, action: AuditAction, success: bool, message: String) -> AuditEntry {
        let entry = AuditEntry {
            actor: self.actor.clone(),
            action,
            success,
            origin: self.origin.clone(),
            message,
            timestamp: Utc::now(),
        };

        match self.gateway.record_activity(&ActivityPayload::from(&entry)).await {
            Ok(()) => debug!(%action, success, "activity recorded"),
            Err(e) => warn!(%action, success, error = %e, "activity log write failed, entry dropped"),
        }

        entry
    }
}
