use std::collections::HashSet;

use adminkit_core::UserId;

use crate::roles::{ADMIN_ROLE, RoleName};

/// A fully resolved acting subject for authorization decisions.
///
/// Construction is intentionally decoupled from storage and transport: the
/// directory resolves role assignments into this snapshot, and every
/// operation takes it as an explicit argument. There is no ambient
/// "current user".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    user_id: UserId,
    roles: Vec<RoleName>,
    permissions: HashSet<String>,
}

impl Subject {
    pub fn new(user_id: UserId, roles: Vec<RoleName>, permissions: HashSet<String>) -> Self {
        Self {
            user_id,
            roles,
            permissions,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn roles(&self) -> &[RoleName] {
        &self.roles
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.as_str() == name)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    /// Membership test against the resolved permission set (union of all
    /// assigned roles' permission names).
    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.contains(name)
    }

    pub fn permissions(&self) -> &HashSet<String> {
        &self.permissions
    }
}
