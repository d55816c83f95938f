//! In-memory registries for accounts, roles, and permissions.
//!
//! All state sits behind a single `RwLock`: each store method acquires the
//! lock once, so every operation is a serializable unit and a reader never
//! observes a half-applied mutation. Role↔permission and user↔role are
//! explicit join sets owned by the records, and "sync" operations replace
//! the whole set or fail without touching it.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use adminkit_auth::{PermissionName, RoleName};
use adminkit_core::{DomainError, DomainResult, Entity, PermissionId, RoleId, UserId};

use crate::account::Account;

/// Default authentication-context tag for roles and permissions.
pub const DEFAULT_GUARD: &str = "web";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionRecord {
    pub id: PermissionId,
    pub name: PermissionName,
    pub guard: String,
}

impl Entity for PermissionRecord {
    type Id = PermissionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleRecord {
    pub id: RoleId,
    pub name: RoleName,
    pub guard: String,
    pub permissions: BTreeSet<PermissionId>,
}

impl Entity for RoleRecord {
    type Id = RoleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Field-wise account update; `None` leaves the field untouched.
///
/// `roles`, when present, replaces the assignment set wholesale.
#[derive(Debug, Default, Clone)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub roles: Option<BTreeSet<RoleId>>,
}

/// Consistent point-in-time copy of the whole directory, in creation order.
///
/// Read models (search, dashboard) work from this instead of holding the
/// store lock while they aggregate.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    pub users: Vec<Account>,
    pub roles: Vec<RoleRecord>,
    pub permissions: Vec<PermissionRecord>,
}

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<UserId, Account>,
    user_order: Vec<UserId>,
    roles: HashMap<RoleId, RoleRecord>,
    role_order: Vec<RoleId>,
    permissions: HashMap<PermissionId, PermissionRecord>,
    permission_order: Vec<PermissionId>,
}

/// The account/role/permission registries.
#[derive(Debug, Default)]
pub struct DirectoryStore {
    inner: RwLock<Inner>,
}

impl DirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Permissions
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_permission(
        &self,
        name: PermissionName,
        guard: Option<String>,
    ) -> DomainResult<PermissionRecord> {
        let mut inner = self.write();

        if inner.permissions.values().any(|p| p.name == name) {
            return Err(DomainError::duplicate_name(name.as_str()));
        }

        let record = PermissionRecord {
            id: PermissionId::new(),
            name,
            guard: guard.unwrap_or_else(|| DEFAULT_GUARD.to_string()),
        };
        inner.permission_order.push(record.id);
        inner.permissions.insert(record.id, record.clone());
        Ok(record)
    }

    pub fn update_permission(
        &self,
        id: PermissionId,
        name: Option<PermissionName>,
        guard: Option<String>,
    ) -> DomainResult<PermissionRecord> {
        let mut inner = self.write();

        if !inner.permissions.contains_key(&id) {
            return Err(DomainError::NotFound);
        }
        if let Some(new_name) = &name {
            let collides = inner
                .permissions
                .values()
                .any(|p| p.id != id && p.name == *new_name);
            if collides {
                return Err(DomainError::duplicate_name(new_name.as_str()));
            }
        }

        let record = inner
            .permissions
            .get_mut(&id)
            .ok_or(DomainError::NotFound)?;
        if let Some(new_name) = name {
            record.name = new_name;
        }
        if let Some(new_guard) = guard {
            record.guard = new_guard;
        }
        Ok(record.clone())
    }

    /// Removes the permission and its association from every role.
    pub fn delete_permission(&self, id: PermissionId) -> DomainResult<()> {
        let mut inner = self.write();

        if inner.permissions.remove(&id).is_none() {
            return Err(DomainError::NotFound);
        }
        inner.permission_order.retain(|p| *p != id);
        for role in inner.roles.values_mut() {
            role.permissions.remove(&id);
        }
        Ok(())
    }

    pub fn permission(&self, id: PermissionId) -> DomainResult<PermissionRecord> {
        self.read()
            .permissions
            .get(&id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    /// All permissions in creation order.
    pub fn permissions(&self) -> Vec<PermissionRecord> {
        let inner = self.read();
        inner
            .permission_order
            .iter()
            .filter_map(|id| inner.permissions.get(id).cloned())
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Roles
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_role(
        &self,
        name: RoleName,
        guard: Option<String>,
        permission_ids: Option<&[PermissionId]>,
    ) -> DomainResult<RoleRecord> {
        let mut inner = self.write();

        if inner.roles.values().any(|r| r.name == name) {
            return Err(DomainError::duplicate_name(name.as_str()));
        }
        let permissions = match permission_ids {
            Some(ids) => Self::validated_permission_set(&inner, ids)?,
            None => BTreeSet::new(),
        };

        let record = RoleRecord {
            id: RoleId::new(),
            name,
            guard: guard.unwrap_or_else(|| DEFAULT_GUARD.to_string()),
            permissions,
        };
        inner.role_order.push(record.id);
        inner.roles.insert(record.id, record.clone());
        Ok(record)
    }

    /// `acting_admin` re-checks the admin-role protection under the write
    /// lock: the policy check happens against an earlier read, and a rename
    /// may land between the two. Mirrors the `delete_role` backstop.
    pub fn update_role(
        &self,
        id: RoleId,
        name: Option<RoleName>,
        permission_ids: Option<&[PermissionId]>,
        acting_admin: bool,
    ) -> DomainResult<RoleRecord> {
        let mut inner = self.write();

        let current = inner.roles.get(&id).ok_or(DomainError::NotFound)?;
        if current.name.is_admin() && !acting_admin {
            return Err(DomainError::forbidden(
                "only admins may modify the admin role",
            ));
        }
        if let Some(new_name) = &name {
            let collides = inner.roles.values().any(|r| r.id != id && r.name == *new_name);
            if collides {
                return Err(DomainError::duplicate_name(new_name.as_str()));
            }
        }
        // Validate before mutating: an invalid reference must leave the
        // previous permission set untouched.
        let permissions = match permission_ids {
            Some(ids) => Some(Self::validated_permission_set(&inner, ids)?),
            None => None,
        };

        let record = inner.roles.get_mut(&id).ok_or(DomainError::NotFound)?;
        if let Some(new_name) = name {
            record.name = new_name;
        }
        if let Some(set) = permissions {
            record.permissions = set;
        }
        Ok(record.clone())
    }

    /// Deleting the role named `admin` is refused unconditionally; this is
    /// a registry-level backstop behind the policy engine's identical rule.
    pub fn delete_role(&self, id: RoleId) -> DomainResult<()> {
        let mut inner = self.write();

        let record = inner.roles.get(&id).ok_or(DomainError::NotFound)?;
        if record.name.is_admin() {
            return Err(DomainError::forbidden("the admin role cannot be deleted"));
        }

        inner.roles.remove(&id);
        inner.role_order.retain(|r| *r != id);
        for user in inner.users.values_mut() {
            user.roles.remove(&id);
        }
        Ok(())
    }

    /// Wholesale replace of a role's permission set. `acting_admin` is the
    /// same under-lock backstop as on [`DirectoryStore::update_role`].
    pub fn assign_role_permissions(
        &self,
        id: RoleId,
        permission_ids: &[PermissionId],
        acting_admin: bool,
    ) -> DomainResult<RoleRecord> {
        let mut inner = self.write();

        let current = inner.roles.get(&id).ok_or(DomainError::NotFound)?;
        if current.name.is_admin() && !acting_admin {
            return Err(DomainError::forbidden(
                "only admins may modify the admin role",
            ));
        }
        let permissions = Self::validated_permission_set(&inner, permission_ids)?;

        let record = inner.roles.get_mut(&id).ok_or(DomainError::NotFound)?;
        record.permissions = permissions;
        Ok(record.clone())
    }

    pub fn role(&self, id: RoleId) -> DomainResult<RoleRecord> {
        self.read().roles.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    pub fn role_by_name(&self, name: &str) -> Option<RoleRecord> {
        self.read()
            .roles
            .values()
            .find(|r| r.name.as_str() == name)
            .cloned()
    }

    /// All roles in creation order.
    pub fn roles(&self) -> Vec<RoleRecord> {
        let inner = self.read();
        inner
            .role_order
            .iter()
            .filter_map(|id| inner.roles.get(id).cloned())
            .collect()
    }

    fn validated_permission_set(
        inner: &Inner,
        ids: &[PermissionId],
    ) -> DomainResult<BTreeSet<PermissionId>> {
        let mut set = BTreeSet::new();
        for id in ids {
            if !inner.permissions.contains_key(id) {
                return Err(DomainError::invalid_reference(format!(
                    "permission {id} does not exist"
                )));
            }
            set.insert(*id);
        }
        Ok(set)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────

    pub fn insert_user(&self, account: Account) -> DomainResult<Account> {
        let mut inner = self.write();

        if inner
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&account.email))
        {
            return Err(DomainError::duplicate_name(&account.email));
        }
        Self::validated_role_set(&inner, &account.roles)?;

        inner.user_order.push(account.id);
        inner.users.insert(account.id, account.clone());
        Ok(account)
    }

    pub fn update_user(&self, id: UserId, patch: AccountPatch) -> DomainResult<Account> {
        let mut inner = self.write();

        if !inner.users.contains_key(&id) {
            return Err(DomainError::NotFound);
        }
        if let Some(email) = &patch.email {
            let taken = inner
                .users
                .values()
                .any(|u| u.id != id && u.email.eq_ignore_ascii_case(email));
            if taken {
                return Err(DomainError::duplicate_name(email));
            }
        }
        if let Some(roles) = &patch.roles {
            Self::validated_role_set(&inner, roles)?;
        }

        let account = inner.users.get_mut(&id).ok_or(DomainError::NotFound)?;
        if let Some(name) = patch.name {
            account.name = name;
        }
        if let Some(email) = patch.email {
            account.email = email;
        }
        if let Some(hash) = patch.password_hash {
            account.set_password(hash);
        }
        if let Some(roles) = patch.roles {
            account.roles = roles;
        }
        Ok(account.clone())
    }

    /// Apply a closure to one account under the store lock.
    pub fn mutate_user<T>(
        &self,
        id: UserId,
        f: impl FnOnce(&mut Account) -> T,
    ) -> DomainResult<T> {
        let mut inner = self.write();
        let account = inner.users.get_mut(&id).ok_or(DomainError::NotFound)?;
        Ok(f(account))
    }

    pub fn delete_user(&self, id: UserId) -> DomainResult<Account> {
        let mut inner = self.write();
        let removed = inner.users.remove(&id).ok_or(DomainError::NotFound)?;
        inner.user_order.retain(|u| *u != id);
        Ok(removed)
    }

    pub fn user(&self, id: UserId) -> DomainResult<Account> {
        self.read().users.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    pub fn user_by_email(&self, email: &str) -> Option<Account> {
        self.read()
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    /// All accounts in creation order.
    pub fn users(&self) -> Vec<Account> {
        let inner = self.read();
        inner
            .user_order
            .iter()
            .filter_map(|id| inner.users.get(id).cloned())
            .collect()
    }

    fn validated_role_set(inner: &Inner, roles: &BTreeSet<RoleId>) -> DomainResult<()> {
        for id in roles {
            if !inner.roles.contains_key(id) {
                return Err(DomainError::invalid_reference(format!(
                    "role {id} does not exist"
                )));
            }
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Resolution + snapshots
    // ─────────────────────────────────────────────────────────────────────

    /// Union of permission names across every role assigned to the user.
    pub fn resolved_permission_names(&self, user_id: UserId) -> DomainResult<HashSet<String>> {
        let inner = self.read();
        let account = inner.users.get(&user_id).ok_or(DomainError::NotFound)?;

        let mut names = HashSet::new();
        for role_id in &account.roles {
            if let Some(role) = inner.roles.get(role_id) {
                for permission_id in &role.permissions {
                    if let Some(permission) = inner.permissions.get(permission_id) {
                        names.insert(permission.name.as_str().to_string());
                    }
                }
            }
        }
        Ok(names)
    }

    pub fn role_names_for(&self, user_id: UserId) -> DomainResult<Vec<RoleName>> {
        let inner = self.read();
        let account = inner.users.get(&user_id).ok_or(DomainError::NotFound)?;
        Ok(account
            .roles
            .iter()
            .filter_map(|id| inner.roles.get(id).map(|r| r.name.clone()))
            .collect())
    }

    pub fn snapshot(&self) -> DirectorySnapshot {
        let inner = self.read();
        DirectorySnapshot {
            users: inner
                .user_order
                .iter()
                .filter_map(|id| inner.users.get(id).cloned())
                .collect(),
            roles: inner
                .role_order
                .iter()
                .filter_map(|id| inner.roles.get(id).cloned())
                .collect(),
            permissions: inner
                .permission_order
                .iter()
                .filter_map(|id| inner.permissions.get(id).cloned())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_permissions(names: &[&str]) -> (DirectoryStore, Vec<PermissionId>) {
        let store = DirectoryStore::new();
        let ids = names
            .iter()
            .map(|n| {
                store
                    .create_permission(PermissionName::from(*n), None)
                    .unwrap()
                    .id
            })
            .collect();
        (store, ids)
    }

    #[test]
    fn duplicate_permission_name_is_rejected() {
        let (store, _) = store_with_permissions(&["users.view"]);
        let err = store
            .create_permission(PermissionName::from("users.view"), None)
            .unwrap_err();
        assert_eq!(err, DomainError::DuplicateName("users.view".to_string()));
    }

    #[test]
    fn permission_rename_collision_is_rejected() {
        let (store, ids) = store_with_permissions(&["users.view", "users.create"]);
        let err = store
            .update_permission(ids[1], Some(PermissionName::from("users.view")), None)
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateName(_)));
    }

    #[test]
    fn deleting_a_permission_detaches_it_from_roles() {
        let (store, ids) = store_with_permissions(&["users.view", "users.create"]);
        let role = store
            .create_role(RoleName::from("manager"), None, Some(&ids))
            .unwrap();
        assert_eq!(role.permissions.len(), 2);

        store.delete_permission(ids[0]).unwrap();
        let role = store.role(role.id).unwrap();
        assert_eq!(role.permissions.len(), 1);
        assert!(role.permissions.contains(&ids[1]));
    }

    #[test]
    fn role_create_with_unknown_permission_fails_atomically() {
        let (store, mut ids) = store_with_permissions(&["users.view"]);
        ids.push(PermissionId::new());

        let err = store
            .create_role(RoleName::from("manager"), None, Some(&ids))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidReference(_)));
        assert!(store.role_by_name("manager").is_none());
    }

    #[test]
    fn permission_sync_failure_leaves_previous_set_untouched() {
        let (store, ids) = store_with_permissions(&["users.view", "users.create"]);
        let role = store
            .create_role(RoleName::from("manager"), None, Some(&ids[..1]))
            .unwrap();

        let bogus = [ids[1], PermissionId::new()];
        let err = store
            .assign_role_permissions(role.id, &bogus, true)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidReference(_)));

        let unchanged = store.role(role.id).unwrap();
        assert_eq!(unchanged.permissions.iter().copied().collect::<Vec<_>>(), &ids[..1]);
    }

    #[test]
    fn permission_sync_is_idempotent() {
        let (store, ids) = store_with_permissions(&["users.view", "users.create"]);
        let role = store.create_role(RoleName::from("manager"), None, None).unwrap();

        let first = store.assign_role_permissions(role.id, &ids, true).unwrap();
        let second = store.assign_role_permissions(role.id, &ids, true).unwrap();
        assert_eq!(first.permissions, second.permissions);
        assert_eq!(second.permissions.len(), 2);
    }

    #[test]
    fn admin_role_cannot_be_deleted_at_the_registry_level() {
        let store = DirectoryStore::new();
        let admin = store.create_role(RoleName::from("admin"), None, None).unwrap();
        let err = store.delete_role(admin.id).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        assert!(store.role(admin.id).is_ok());
    }

    #[test]
    fn admin_role_edits_are_refused_under_the_write_lock_for_non_admins() {
        // Covers the rename race: a role approved for update under one lock
        // acquisition may be named `admin` by the time the write lands.
        let (store, ids) = store_with_permissions(&["users.view"]);
        let role = store.create_role(RoleName::from("ops"), None, None).unwrap();
        store
            .update_role(role.id, Some(RoleName::from("admin")), None, true)
            .unwrap();

        let err = store
            .update_role(role.id, None, Some(&ids), false)
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = store
            .assign_role_permissions(role.id, &ids, false)
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        assert!(store.role(role.id).unwrap().permissions.is_empty());

        // Admins still may.
        let updated = store.assign_role_permissions(role.id, &ids, true).unwrap();
        assert_eq!(updated.permissions.len(), 1);
    }

    #[test]
    fn deleting_a_role_detaches_it_from_users() {
        let store = DirectoryStore::new();
        let role = store.create_role(RoleName::from("editor"), None, None).unwrap();
        let account = store
            .insert_user(Account::new(
                "Alice",
                "alice@example.com",
                "hash",
                BTreeSet::from([role.id]),
            ))
            .unwrap();

        store.delete_role(role.id).unwrap();
        assert!(store.user(account.id).unwrap().roles.is_empty());
    }

    #[test]
    fn duplicate_email_is_rejected_case_insensitively() {
        let store = DirectoryStore::new();
        store
            .insert_user(Account::new("A", "a@example.com", "h", BTreeSet::new()))
            .unwrap();
        let err = store
            .insert_user(Account::new("B", "A@Example.com", "h", BTreeSet::new()))
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateName(_)));
    }

    #[test]
    fn resolved_permissions_union_across_roles() {
        let (store, ids) = store_with_permissions(&["users.view", "roles.view", "dashboard.view"]);
        let viewer = store
            .create_role(RoleName::from("viewer"), None, Some(&ids[..2]))
            .unwrap();
        let reporter = store
            .create_role(RoleName::from("reporter"), None, Some(&ids[1..]))
            .unwrap();
        let account = store
            .insert_user(Account::new(
                "Alice",
                "alice@example.com",
                "hash",
                BTreeSet::from([viewer.id, reporter.id]),
            ))
            .unwrap();

        let resolved = store.resolved_permission_names(account.id).unwrap();
        assert_eq!(resolved.len(), 3);
        assert!(resolved.contains("users.view"));
        assert!(resolved.contains("roles.view"));
        assert!(resolved.contains("dashboard.view"));
    }

    #[test]
    fn permissions_keep_creation_order() {
        let (store, _) = store_with_permissions(&["b.view", "a.view", "c.view"]);
        let names: Vec<_> = store
            .permissions()
            .iter()
            .map(|p| p.name.as_str().to_string())
            .collect();
        assert_eq!(names, ["b.view", "a.view", "c.view"]);
    }
}
