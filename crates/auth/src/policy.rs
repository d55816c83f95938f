//! Authorization policy engine.
//!
//! One decision function per entity type, evaluated as an explicit decision
//! table: structural rules first (they can allow *and* deny independent of
//! permission grants), then the generic `"<resource>.<action>"` lookup
//! against the subject's resolved permission set, then deny.
//!
//! The admin-role protections sit ahead of the generic lookup on purpose:
//! they must hold even for a subject who technically holds `roles.delete` or
//! `roles.update`, and must not be revocable by reconfiguring permissions.

use adminkit_core::{DomainError, UserId};
use thiserror::Error;

use crate::roles::RoleName;
use crate::subject::Subject;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::Forbidden(msg) => DomainError::Forbidden(msg),
        }
    }
}

/// Actions against user accounts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UserAction {
    ViewAny,
    View,
    Create,
    Update,
    Delete,
}

/// Actions against roles.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RoleAction {
    ViewAny,
    View,
    Create,
    Update,
    Delete,
    AssignPermissions,
}

/// Actions against permissions.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PermissionAction {
    ViewAny,
    View,
    Create,
    Update,
    Delete,
}

impl RoleAction {
    fn required_permission(self) -> &'static str {
        match self {
            RoleAction::ViewAny | RoleAction::View => "roles.view",
            RoleAction::Create => "roles.create",
            RoleAction::Update => "roles.update",
            RoleAction::Delete => "roles.delete",
            RoleAction::AssignPermissions => "roles.assign-permissions",
        }
    }
}

impl PermissionAction {
    fn required_permission(self) -> &'static str {
        match self {
            PermissionAction::ViewAny | PermissionAction::View => "permissions.view",
            PermissionAction::Create => "permissions.create",
            PermissionAction::Update => "permissions.update",
            PermissionAction::Delete => "permissions.delete",
        }
    }
}

/// Decide a user-account action.
///
/// All user actions are self-determined: admins may do anything except
/// delete themselves, and any subject may view/update their own account.
/// There is no fallthrough to permission grants for the covered actions.
pub fn authorize_user(
    subject: &Subject,
    action: UserAction,
    target: Option<UserId>,
) -> Result<(), AuthzError> {
    match action {
        UserAction::ViewAny | UserAction::Create => {
            if subject.is_admin() {
                Ok(())
            } else {
                Err(forbidden("requires the admin role"))
            }
        }
        UserAction::View | UserAction::Update => {
            let is_self = target.is_some_and(|t| t == subject.user_id());
            if subject.is_admin() || is_self {
                Ok(())
            } else {
                Err(forbidden("requires the admin role or self"))
            }
        }
        UserAction::Delete => {
            if !subject.is_admin() {
                return Err(forbidden("requires the admin role"));
            }
            match target {
                Some(t) if t != subject.user_id() => Ok(()),
                Some(_) => Err(forbidden("admins may not delete their own account")),
                None => Err(forbidden("delete requires a target account")),
            }
        }
    }
}

/// Decide a role action.
///
/// Structural rules on the role named `admin` take precedence over any
/// granted permission.
pub fn authorize_role(
    subject: &Subject,
    action: RoleAction,
    target: Option<&RoleName>,
) -> Result<(), AuthzError> {
    let target_is_admin_role = target.is_some_and(RoleName::is_admin);

    match action {
        RoleAction::Delete if target_is_admin_role => {
            // Unconditional: not even admins may delete the admin role.
            return Err(forbidden("the admin role cannot be deleted"));
        }
        RoleAction::Update | RoleAction::AssignPermissions
            if target_is_admin_role && !subject.is_admin() =>
        {
            return Err(forbidden("only admins may edit the admin role"));
        }
        _ => {}
    }

    require(subject, action.required_permission())
}

/// Decide a permission action. No structural rules; pure permission lookup.
pub fn authorize_permission(subject: &Subject, action: PermissionAction) -> Result<(), AuthzError> {
    require(subject, action.required_permission())
}

fn require(subject: &Subject, permission: &str) -> Result<(), AuthzError> {
    if subject.has_permission(permission) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(format!(
            "missing permission '{permission}'"
        )))
    }
}

fn forbidden(msg: &str) -> AuthzError {
    AuthzError::Forbidden(msg.to_string())
}
