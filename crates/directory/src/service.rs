//! Policy-gated admin operations.
//!
//! Every mutating method follows the same protocol: resolve the target,
//! ask the policy engine, mutate the registry, append an audit entry. The
//! acting subject is always an explicit argument; nothing here reads an
//! ambient "current user".

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use adminkit_audit::{AuditEntry, AuditTarget, AuditTrail};
use adminkit_auth::{
    PasswordHasher, PermissionAction, PermissionName, RoleAction, RoleName, Subject, UserAction,
    authorize_permission, authorize_role, authorize_user,
};
use adminkit_core::{DomainError, DomainResult, PermissionId, RoleId, UserId};

use crate::account::Account;
use crate::dashboard::{self, DashboardCharts, DashboardStats};
use crate::store::{AccountPatch, DirectoryStore, PermissionRecord, RoleRecord};
use crate::views::{
    self, AccountSummary, GroupedPermission, Page, RoleOverview,
};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_NAME_LEN: usize = 255;

/// Input for account creation. At least one role is required.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub roles: Vec<RoleId>,
}

/// Field-wise account update; `roles`, when present, replaces the
/// assignment set wholesale.
#[derive(Debug, Default, Clone)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub roles: Option<Vec<RoleId>>,
}

#[derive(Debug, Clone)]
pub struct NewRole {
    pub name: String,
    pub guard: Option<String>,
    pub permissions: Option<Vec<PermissionId>>,
}

#[derive(Debug, Default, Clone)]
pub struct RolePatch {
    pub name: Option<String>,
    pub permissions: Option<Vec<PermissionId>>,
}

/// The admin back-office service.
pub struct AdminService {
    store: Arc<DirectoryStore>,
    audit: Arc<dyn AuditTrail>,
    hasher: Arc<dyn PasswordHasher>,
}

impl AdminService {
    pub fn new(
        store: Arc<DirectoryStore>,
        audit: Arc<dyn AuditTrail>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            store,
            audit,
            hasher,
        }
    }

    pub fn store(&self) -> &Arc<DirectoryStore> {
        &self.store
    }

    /// Resolve an account into an acting subject: role names plus the union
    /// of all assigned roles' permission names.
    pub fn resolve_subject(&self, user_id: UserId) -> DomainResult<Subject> {
        let roles = self.store.role_names_for(user_id)?;
        let permissions = self.store.resolved_permission_names(user_id)?;
        Ok(Subject::new(user_id, roles, permissions))
    }

    /// Credential check first, then the account-state gate: a deactivated
    /// or blocked account never logs in, even with correct credentials.
    pub fn login(&self, email: &str, password: &str) -> Option<Account> {
        let account = self.store.user_by_email(email)?;
        if !self.hasher.verify(password, &account.password_hash) {
            tracing::debug!(email, "login rejected: bad credentials");
            return None;
        }
        if !account.login_permitted() {
            tracing::info!(email, "login rejected: account inactive or blocked");
            return None;
        }
        Some(account)
    }

    fn log(&self, subject: &Subject, action: &str, target: AuditTarget) {
        self.audit
            .record(AuditEntry::new(subject.user_id(), action, target));
    }

    fn hash_password(&self, plaintext: &str) -> DomainResult<String> {
        if plaintext.len() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        self.hasher
            .hash(plaintext)
            .map_err(|e| DomainError::validation(e.to_string()))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accounts
    // ─────────────────────────────────────────────────────────────────────

    pub fn list_users(
        &self,
        subject: &Subject,
        query: Option<&str>,
        page: usize,
    ) -> DomainResult<Page<AccountSummary>> {
        authorize_user(subject, UserAction::ViewAny, None)?;

        let snapshot = self.store.snapshot();
        let summaries = views::search_accounts(&snapshot, query)
            .iter()
            .map(|a| AccountSummary::new(a, views::role_summaries(&snapshot, a)))
            .collect();
        Ok(Page::paginate(summaries, page))
    }

    /// Target resolution happens before the policy check, so a missing
    /// account is `NotFound` even for subjects who would have been denied.
    pub fn get_user(&self, subject: &Subject, id: UserId) -> DomainResult<AccountSummary> {
        let account = self.store.user(id)?;
        authorize_user(subject, UserAction::View, Some(id))?;
        Ok(self.summarize(&account))
    }

    pub fn create_user(&self, subject: &Subject, input: NewUser) -> DomainResult<AccountSummary> {
        authorize_user(subject, UserAction::Create, None)?;

        validate_name(&input.name)?;
        validate_email(&input.email)?;
        if input.roles.is_empty() {
            return Err(DomainError::validation("at least one role is required"));
        }

        let hash = self.hash_password(&input.password)?;
        let roles: BTreeSet<RoleId> = input.roles.into_iter().collect();
        let account = self
            .store
            .insert_user(Account::new(input.name, input.email, hash, roles))?;

        tracing::info!(user = %account.id, "created user");
        self.log(subject, "Created user", AuditTarget::User(account.id));
        Ok(self.summarize(&account))
    }

    pub fn update_user(
        &self,
        subject: &Subject,
        id: UserId,
        patch: UserPatch,
    ) -> DomainResult<AccountSummary> {
        self.store.user(id)?;
        authorize_user(subject, UserAction::Update, Some(id))?;

        // Self-updates cover profile fields only; role reassignment is an
        // admin capability, otherwise anyone could grant themselves admin.
        if patch.roles.is_some() && !subject.is_admin() {
            return Err(DomainError::forbidden(
                "only admins may change role assignments",
            ));
        }

        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        if let Some(email) = &patch.email {
            validate_email(email)?;
        }
        if patch.roles.as_ref().is_some_and(Vec::is_empty) {
            return Err(DomainError::validation("at least one role is required"));
        }
        let password_hash = match &patch.password {
            Some(plaintext) => Some(self.hash_password(plaintext)?),
            None => None,
        };

        let account = self.store.update_user(
            id,
            AccountPatch {
                name: patch.name,
                email: patch.email,
                password_hash,
                roles: patch.roles.map(|r| r.into_iter().collect()),
            },
        )?;

        tracing::info!(user = %id, "updated user");
        self.log(subject, "Updated user", AuditTarget::User(id));
        Ok(self.summarize(&account))
    }

    pub fn delete_user(&self, subject: &Subject, id: UserId) -> DomainResult<()> {
        self.store.user(id)?;
        authorize_user(subject, UserAction::Delete, Some(id))?;

        self.store.delete_user(id)?;
        tracing::info!(user = %id, "deleted user");
        self.log(subject, "Deleted user", AuditTarget::User(id));
        Ok(())
    }

    /// Flip the `active` flag and return the new value.
    pub fn toggle_active(&self, subject: &Subject, id: UserId) -> DomainResult<bool> {
        self.store.user(id)?;
        authorize_user(subject, UserAction::Update, Some(id))?;

        let active = self.store.mutate_user(id, Account::toggle_active)?;
        self.log(subject, "Toggled active", AuditTarget::User(id));
        Ok(active)
    }

    pub fn block(&self, subject: &Subject, id: UserId) -> DomainResult<bool> {
        self.store.user(id)?;
        authorize_user(subject, UserAction::Update, Some(id))?;

        self.store.mutate_user(id, Account::block)?;
        self.log(subject, "Blocked user", AuditTarget::User(id));
        Ok(true)
    }

    pub fn unblock(&self, subject: &Subject, id: UserId) -> DomainResult<bool> {
        self.store.user(id)?;
        authorize_user(subject, UserAction::Update, Some(id))?;

        self.store.mutate_user(id, Account::unblock)?;
        self.log(subject, "Unblocked user", AuditTarget::User(id));
        Ok(false)
    }

    pub fn disable_two_factor(&self, subject: &Subject, id: UserId) -> DomainResult<()> {
        self.store.user(id)?;
        authorize_user(subject, UserAction::Update, Some(id))?;

        self.store.mutate_user(id, Account::disable_two_factor)?;
        self.log(subject, "Disabled 2FA", AuditTarget::User(id));
        Ok(())
    }

    pub fn force_password_reset(&self, subject: &Subject, id: UserId) -> DomainResult<()> {
        self.store.user(id)?;
        authorize_user(subject, UserAction::Update, Some(id))?;

        self.store.mutate_user(id, Account::force_password_reset)?;
        self.log(subject, "Forced password reset", AuditTarget::User(id));
        Ok(())
    }

    /// The normal credential-update path; clears a pending forced reset.
    pub fn update_password(
        &self,
        subject: &Subject,
        id: UserId,
        new_password: &str,
    ) -> DomainResult<()> {
        self.store.user(id)?;
        authorize_user(subject, UserAction::Update, Some(id))?;

        let hash = self.hash_password(new_password)?;
        self.store.mutate_user(id, |account| account.set_password(hash))?;
        self.log(subject, "Updated user", AuditTarget::User(id));
        Ok(())
    }

    fn summarize(&self, account: &Account) -> AccountSummary {
        let snapshot = self.store.snapshot();
        AccountSummary::new(account, views::role_summaries(&snapshot, account))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Roles
    // ─────────────────────────────────────────────────────────────────────

    pub fn list_roles(&self, subject: &Subject, page: usize) -> DomainResult<Page<RoleOverview>> {
        authorize_role(subject, RoleAction::ViewAny, None)?;
        Ok(Page::paginate(
            views::role_overviews(&self.store.snapshot()),
            page,
        ))
    }

    pub fn get_role(&self, subject: &Subject, id: RoleId) -> DomainResult<RoleOverview> {
        let role = self.store.role(id)?;
        authorize_role(subject, RoleAction::View, Some(&role.name))?;
        Ok(views::role_overview(&self.store.snapshot(), &role))
    }

    pub fn create_role(&self, subject: &Subject, input: NewRole) -> DomainResult<RoleOverview> {
        authorize_role(subject, RoleAction::Create, None)?;
        validate_name(&input.name)?;

        let role = self.store.create_role(
            RoleName::from(input.name.as_str()),
            input.guard,
            input.permissions.as_deref(),
        )?;

        tracing::info!(role = %role.id, name = %role.name, "created role");
        self.log(subject, "Created role", AuditTarget::Role(role.id));
        Ok(views::role_overview(&self.store.snapshot(), &role))
    }

    pub fn update_role(
        &self,
        subject: &Subject,
        id: RoleId,
        patch: RolePatch,
    ) -> DomainResult<RoleOverview> {
        let current = self.store.role(id)?;
        authorize_role(subject, RoleAction::Update, Some(&current.name))?;

        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        let role = self.store.update_role(
            id,
            patch.name.map(|n| RoleName::from(n.as_str())),
            patch.permissions.as_deref(),
            subject.is_admin(),
        )?;

        tracing::info!(role = %id, "updated role");
        self.log(subject, "Updated role", AuditTarget::Role(id));
        Ok(views::role_overview(&self.store.snapshot(), &role))
    }

    pub fn delete_role(&self, subject: &Subject, id: RoleId) -> DomainResult<()> {
        let role = self.store.role(id)?;
        authorize_role(subject, RoleAction::Delete, Some(&role.name))?;

        self.store.delete_role(id)?;
        tracing::info!(role = %id, "deleted role");
        self.log(subject, "Deleted role", AuditTarget::Role(id));
        Ok(())
    }

    /// Wholesale replace of a role's permission set; an unknown id fails the
    /// whole call and leaves the previous set untouched.
    pub fn assign_permissions(
        &self,
        subject: &Subject,
        id: RoleId,
        permission_ids: &[PermissionId],
    ) -> DomainResult<RoleOverview> {
        let role = self.store.role(id)?;
        authorize_role(subject, RoleAction::AssignPermissions, Some(&role.name))?;

        let role = self
            .store
            .assign_role_permissions(id, permission_ids, subject.is_admin())?;
        self.log(subject, "Updated role permissions", AuditTarget::Role(id));
        Ok(views::role_overview(&self.store.snapshot(), &role))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Permissions
    // ─────────────────────────────────────────────────────────────────────

    pub fn list_permissions(
        &self,
        subject: &Subject,
        page: usize,
    ) -> DomainResult<Page<PermissionRecord>> {
        authorize_permission(subject, PermissionAction::ViewAny)?;
        Ok(Page::paginate(self.store.permissions(), page))
    }

    pub fn grouped_permissions(
        &self,
        subject: &Subject,
    ) -> DomainResult<BTreeMap<String, Vec<GroupedPermission>>> {
        authorize_permission(subject, PermissionAction::ViewAny)?;
        Ok(views::grouped_permissions(&self.store.permissions()))
    }

    pub fn get_permission(
        &self,
        subject: &Subject,
        id: PermissionId,
    ) -> DomainResult<PermissionRecord> {
        let permission = self.store.permission(id)?;
        authorize_permission(subject, PermissionAction::View)?;
        Ok(permission)
    }

    pub fn create_permission(
        &self,
        subject: &Subject,
        name: &str,
        guard: Option<String>,
    ) -> DomainResult<PermissionRecord> {
        authorize_permission(subject, PermissionAction::Create)?;
        validate_name(name)?;

        let permission = self.store.create_permission(PermissionName::from(name), guard)?;
        tracing::info!(permission = %permission.id, name = %permission.name, "created permission");
        self.log(subject, "Created permission", AuditTarget::Permission(permission.id));
        Ok(permission)
    }

    pub fn update_permission(
        &self,
        subject: &Subject,
        id: PermissionId,
        name: Option<&str>,
        guard: Option<String>,
    ) -> DomainResult<PermissionRecord> {
        self.store.permission(id)?;
        authorize_permission(subject, PermissionAction::Update)?;

        if let Some(name) = name {
            validate_name(name)?;
        }
        let permission =
            self.store
                .update_permission(id, name.map(PermissionName::from), guard)?;
        self.log(subject, "Updated permission", AuditTarget::Permission(id));
        Ok(permission)
    }

    pub fn delete_permission(&self, subject: &Subject, id: PermissionId) -> DomainResult<()> {
        self.store.permission(id)?;
        authorize_permission(subject, PermissionAction::Delete)?;

        self.store.delete_permission(id)?;
        self.log(subject, "Deleted permission", AuditTarget::Permission(id));
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Dashboard
    // ─────────────────────────────────────────────────────────────────────

    pub fn dashboard_stats(&self, subject: &Subject) -> DomainResult<DashboardStats> {
        self.dashboard_stats_at(subject, Utc::now())
    }

    pub fn dashboard_stats_at(
        &self,
        subject: &Subject,
        now: DateTime<Utc>,
    ) -> DomainResult<DashboardStats> {
        require_permission(subject, "dashboard.stats")?;
        Ok(dashboard::stats(&self.store.snapshot(), now))
    }

    pub fn dashboard_charts(&self, subject: &Subject) -> DomainResult<DashboardCharts> {
        self.dashboard_charts_at(subject, Utc::now())
    }

    pub fn dashboard_charts_at(
        &self,
        subject: &Subject,
        now: DateTime<Utc>,
    ) -> DomainResult<DashboardCharts> {
        require_permission(subject, "dashboard.view")?;
        Ok(dashboard::charts(&self.store.snapshot(), now))
    }

    /// Most recent audit entries, newest first. Admin only.
    pub fn recent_activity(
        &self,
        subject: &Subject,
        limit: usize,
    ) -> DomainResult<Vec<AuditEntry>> {
        if !subject.is_admin() {
            return Err(DomainError::forbidden("requires the admin role"));
        }
        Ok(self.audit.recent(limit))
    }
}

fn require_permission(subject: &Subject, permission: &str) -> DomainResult<()> {
    if subject.has_permission(permission) {
        Ok(())
    } else {
        Err(DomainError::forbidden(format!(
            "missing permission '{permission}'"
        )))
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name is required"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "name may be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> DomainResult<()> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(DomainError::validation("a valid email is required"));
    }
    Ok(())
}
