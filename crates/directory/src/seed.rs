//! Canonical seed data: the permission catalogue, the three stock roles,
//! and one account per role.

use std::collections::BTreeSet;

use adminkit_auth::{PasswordHasher, PermissionName, RoleName};
use adminkit_core::{DomainError, DomainResult, PermissionId};

use crate::account::Account;
use crate::store::{DirectoryStore, RoleRecord};

/// Every permission the back-office knows about, in catalogue order.
pub const PERMISSION_CATALOGUE: &[&str] = &[
    "users.view",
    "users.create",
    "users.update",
    "users.delete",
    "users.block",
    "users.activate",
    "users.force-password-reset",
    "users.disable-2fa",
    "roles.view",
    "roles.create",
    "roles.update",
    "roles.delete",
    "roles.assign-permissions",
    "permissions.view",
    "permissions.create",
    "permissions.update",
    "permissions.delete",
    "dashboard.view",
    "dashboard.stats",
    "dashboard.reports",
    "profile.update",
    "profile.delete",
    "api.access",
    "api.tokens.create",
    "api.tokens.delete",
];

const EDITOR_PERMISSIONS: &[&str] = &[
    "users.view",
    "users.update",
    "roles.view",
    "permissions.view",
    "dashboard.view",
    "dashboard.stats",
    "profile.update",
    "api.access",
];

const USER_PERMISSIONS: &[&str] = &["dashboard.view", "profile.update", "api.access"];

const SEED_PASSWORD: &str = "password";

#[derive(Debug, Clone)]
pub struct SeededDirectory {
    pub admin_role: RoleRecord,
    pub editor_role: RoleRecord,
    pub user_role: RoleRecord,
    pub admin: Account,
    pub editor: Account,
    pub user: Account,
}

/// Populate an empty store with the catalogue, the `admin`/`editor`/`user`
/// roles, and one account per role. `admin` receives every permission.
pub fn seed_defaults(
    store: &DirectoryStore,
    hasher: &dyn PasswordHasher,
) -> DomainResult<SeededDirectory> {
    let mut all_ids: Vec<PermissionId> = Vec::with_capacity(PERMISSION_CATALOGUE.len());
    for name in PERMISSION_CATALOGUE {
        let record = store.create_permission(PermissionName::new(*name), None)?;
        all_ids.push(record.id);
    }

    let ids_for = |names: &[&str]| -> Vec<PermissionId> {
        store
            .permissions()
            .iter()
            .filter(|p| names.contains(&p.name.as_str()))
            .map(|p| p.id)
            .collect()
    };

    let admin_role = store.create_role(RoleName::new("admin"), None, Some(&all_ids))?;
    let editor_role =
        store.create_role(RoleName::new("editor"), None, Some(&ids_for(EDITOR_PERMISSIONS)))?;
    let user_role =
        store.create_role(RoleName::new("user"), None, Some(&ids_for(USER_PERMISSIONS)))?;

    let hash = hasher
        .hash(SEED_PASSWORD)
        .map_err(|e| DomainError::validation(e.to_string()))?;

    let admin = store.insert_user(Account::new(
        "Admin User",
        "admin@example.com",
        hash.clone(),
        BTreeSet::from([admin_role.id]),
    ))?;
    let editor = store.insert_user(Account::new(
        "Editor User",
        "editor@example.com",
        hash.clone(),
        BTreeSet::from([editor_role.id]),
    ))?;
    let user = store.insert_user(Account::new(
        "Regular User",
        "user@example.com",
        hash,
        BTreeSet::from([user_role.id]),
    ))?;

    Ok(SeededDirectory {
        admin_role,
        editor_role,
        user_role,
        admin,
        editor,
        user,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cheap stand-in so seed tests do not pay for Argon2.
    struct PlainHasher;

    impl PasswordHasher for PlainHasher {
        fn hash(&self, plaintext: &str) -> Result<String, adminkit_auth::PasswordHashError> {
            Ok(format!("plain:{plaintext}"))
        }

        fn verify(&self, plaintext: &str, hash: &str) -> bool {
            hash == format!("plain:{plaintext}")
        }
    }

    #[test]
    fn seed_creates_catalogue_roles_and_accounts() {
        let store = DirectoryStore::new();
        let seeded = seed_defaults(&store, &PlainHasher).unwrap();

        assert_eq!(store.permissions().len(), PERMISSION_CATALOGUE.len());
        assert_eq!(store.roles().len(), 3);
        assert_eq!(store.users().len(), 3);
        assert_eq!(seeded.admin_role.permissions.len(), PERMISSION_CATALOGUE.len());
        assert_eq!(seeded.editor_role.permissions.len(), 8);
        assert_eq!(seeded.user_role.permissions.len(), 3);
    }

    #[test]
    fn editor_resolves_exactly_the_editor_set() {
        let store = DirectoryStore::new();
        let seeded = seed_defaults(&store, &PlainHasher).unwrap();

        let resolved = store.resolved_permission_names(seeded.editor.id).unwrap();
        let expected: std::collections::HashSet<String> =
            EDITOR_PERMISSIONS.iter().map(|p| p.to_string()).collect();
        assert_eq!(resolved, expected);
    }
}
