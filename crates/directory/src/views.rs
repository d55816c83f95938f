//! Read models: pagination, account/role summaries, grouped permissions.

use std::collections::BTreeMap;

use serde::Serialize;

use adminkit_core::{PermissionId, RoleId, UserId};
use chrono::{DateTime, Utc};

use crate::account::Account;
use crate::store::{DirectorySnapshot, PermissionRecord, RoleRecord};

/// Fixed page size for every listing surface.
pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number.
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
}

impl<T> Page<T> {
    /// Slice out one page; out-of-range pages yield an empty item list.
    /// The page number comes straight from the query string, so the offset
    /// arithmetic saturates instead of overflowing.
    pub fn paginate(items: Vec<T>, page: usize) -> Self {
        let page = page.max(1);
        let total = items.len();
        let items = items
            .into_iter()
            .skip(page.saturating_sub(1).saturating_mul(PAGE_SIZE))
            .take(PAGE_SIZE)
            .collect();
        Self {
            items,
            page,
            per_page: PAGE_SIZE,
            total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleSummary {
    pub id: RoleId,
    pub name: String,
}

/// Account projection for listing surfaces; never carries the credential hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub active: bool,
    pub blocked: bool,
    pub force_password_reset: bool,
    pub two_factor_confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub roles: Vec<RoleSummary>,
}

impl AccountSummary {
    pub fn new(account: &Account, roles: Vec<RoleSummary>) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            active: account.active,
            blocked: account.blocked,
            force_password_reset: account.force_password_reset,
            two_factor_confirmed: account.two_factor_confirmed(),
            created_at: account.created_at,
            roles,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionBrief {
    pub id: PermissionId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleOverview {
    pub id: RoleId,
    pub name: String,
    pub guard: String,
    pub permissions: Vec<PermissionBrief>,
    pub user_count: usize,
}

/// One permission as it appears inside a resource group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupedPermission {
    pub id: PermissionId,
    pub name: String,
    pub action: String,
}

/// Partition permissions by resource prefix, preserving creation order
/// within each group.
pub fn grouped_permissions(
    permissions: &[PermissionRecord],
) -> BTreeMap<String, Vec<GroupedPermission>> {
    let mut groups: BTreeMap<String, Vec<GroupedPermission>> = BTreeMap::new();
    for permission in permissions {
        groups
            .entry(permission.name.resource().to_string())
            .or_default()
            .push(GroupedPermission {
                id: permission.id,
                name: permission.name.as_str().to_string(),
                action: permission.name.action().to_string(),
            });
    }
    groups
}

/// Free-text account search over name/email (case-insensitive substring),
/// newest accounts first.
pub fn search_accounts(snapshot: &DirectorySnapshot, query: Option<&str>) -> Vec<Account> {
    let mut accounts: Vec<Account> = match query {
        Some(q) if !q.trim().is_empty() => {
            let needle = q.trim().to_lowercase();
            snapshot
                .users
                .iter()
                .filter(|u| {
                    u.name.to_lowercase().contains(&needle)
                        || u.email.to_lowercase().contains(&needle)
                })
                .cloned()
                .collect()
        }
        _ => snapshot.users.clone(),
    };
    accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    accounts
}

/// Role summaries for one account, resolved against a snapshot.
pub fn role_summaries(snapshot: &DirectorySnapshot, account: &Account) -> Vec<RoleSummary> {
    snapshot
        .roles
        .iter()
        .filter(|r| account.roles.contains(&r.id))
        .map(|r| RoleSummary {
            id: r.id,
            name: r.name.as_str().to_string(),
        })
        .collect()
}

/// Role overviews with permission briefs and per-role user counts.
pub fn role_overviews(snapshot: &DirectorySnapshot) -> Vec<RoleOverview> {
    snapshot
        .roles
        .iter()
        .map(|role| role_overview(snapshot, role))
        .collect()
}

pub fn role_overview(snapshot: &DirectorySnapshot, role: &RoleRecord) -> RoleOverview {
    let permissions = snapshot
        .permissions
        .iter()
        .filter(|p| role.permissions.contains(&p.id))
        .map(|p| PermissionBrief {
            id: p.id,
            name: p.name.as_str().to_string(),
        })
        .collect();
    let user_count = snapshot
        .users
        .iter()
        .filter(|u| u.roles.contains(&role.id))
        .count();
    RoleOverview {
        id: role.id,
        name: role.name.as_str().to_string(),
        guard: role.guard.clone(),
        permissions,
        user_count,
    }
}

#[cfg(test)]
mod tests {
    use adminkit_auth::PermissionName;

    use crate::store::DirectoryStore;

    use super::*;

    #[test]
    fn pagination_slices_ten_per_page() {
        let items: Vec<u32> = (0..25).collect();
        let page = Page::paginate(items.clone(), 1);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total, 25);

        let page3 = Page::paginate(items.clone(), 3);
        assert_eq!(page3.items, vec![20, 21, 22, 23, 24]);

        let beyond = Page::paginate(items, 4);
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 25);
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        let page = Page::paginate(vec![1, 2, 3], usize::MAX);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
        assert_eq!(page.page, usize::MAX);
    }

    #[test]
    fn grouping_partitions_by_resource_prefix() {
        let store = DirectoryStore::new();
        for name in ["users.view", "users.create", "dashboard.view", "api.access"] {
            store.create_permission(PermissionName::from(name), None).unwrap();
        }

        let groups = grouped_permissions(&store.permissions());
        assert_eq!(groups.len(), 3);

        let actions =
            |key: &str| -> Vec<&str> { groups[key].iter().map(|g| g.action.as_str()).collect() };
        assert_eq!(actions("users"), ["view", "create"]);
        assert_eq!(actions("dashboard"), ["view"]);
        assert_eq!(actions("api"), ["access"]);
        assert!(!groups.values().flatten().any(|g| g.action == "other"));
    }

    #[test]
    fn dotless_permission_lands_in_other() {
        let store = DirectoryStore::new();
        store.create_permission(PermissionName::from("superuser"), None).unwrap();

        let groups = grouped_permissions(&store.permissions());
        assert_eq!(groups["superuser"][0].action, "other");
    }

    #[test]
    fn search_matches_name_or_email() {
        use std::collections::BTreeSet;

        use crate::account::Account;

        let store = DirectoryStore::new();
        store
            .insert_user(Account::new("Alice", "alice@example.com", "h", BTreeSet::new()))
            .unwrap();
        store
            .insert_user(Account::new("Bob", "bob@corp.test", "h", BTreeSet::new()))
            .unwrap();

        let snapshot = store.snapshot();
        assert_eq!(search_accounts(&snapshot, Some("ALICE")).len(), 1);
        assert_eq!(search_accounts(&snapshot, Some("corp.test")).len(), 1);
        assert_eq!(search_accounts(&snapshot, Some("nobody")).len(), 0);
        assert_eq!(search_accounts(&snapshot, None).len(), 2);
    }
}
