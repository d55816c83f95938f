use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adminkit_core::{PermissionId, RoleId, UserId};

/// The entity an audited action was performed against.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum AuditTarget {
    User(UserId),
    Role(RoleId),
    Permission(PermissionId),
}

/// One audit record: who did what to whom, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// The acting subject.
    pub actor: UserId,

    /// Human-readable verb, e.g. `"Blocked user"`.
    pub action: String,

    pub target: AuditTarget,

    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(actor: UserId, action: impl Into<String>, target: AuditTarget) -> Self {
        Self {
            actor,
            action: action.into(),
            target,
            recorded_at: Utc::now(),
        }
    }
}
