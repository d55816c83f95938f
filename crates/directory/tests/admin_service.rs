//! End-to-end tests for the policy-gated admin service: the check → mutate →
//! log protocol, the admin-role structural protections, and the login gate.

use std::sync::Arc;

use adminkit_audit::{AuditTrail, InMemoryAuditTrail};
use adminkit_auth::{PasswordHashError, PasswordHasher, Subject};
use adminkit_core::{DomainError, PermissionId};
use adminkit_directory::{
    AdminService, DirectoryStore, NewRole, NewUser, RolePatch, UserPatch, seed_defaults,
};

/// Deterministic stand-in so tests do not pay for Argon2.
struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordHashError> {
        Ok(format!("plain:{plaintext}"))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> bool {
        hash == format!("plain:{plaintext}")
    }
}

struct Fixture {
    service: AdminService,
    audit: Arc<InMemoryAuditTrail>,
    seeded: adminkit_directory::SeededDirectory,
}

fn fixture() -> Fixture {
    let store = Arc::new(DirectoryStore::new());
    let audit = Arc::new(InMemoryAuditTrail::new());
    let seeded = seed_defaults(&store, &PlainHasher).unwrap();
    let service = AdminService::new(store, audit.clone(), Arc::new(PlainHasher));
    Fixture {
        service,
        audit,
        seeded,
    }
}

fn admin_subject(f: &Fixture) -> Subject {
    f.service.resolve_subject(f.seeded.admin.id).unwrap()
}

fn editor_subject(f: &Fixture) -> Subject {
    f.service.resolve_subject(f.seeded.editor.id).unwrap()
}

#[test]
fn admin_role_cannot_be_deleted_by_anyone() {
    let f = fixture();
    let admin = admin_subject(&f);

    let err = f
        .service
        .delete_role(&admin, f.seeded.admin_role.id)
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
    assert!(f.service.store().role(f.seeded.admin_role.id).is_ok());
}

#[test]
fn granted_roles_delete_does_not_override_the_structural_rule() {
    let f = fixture();
    let admin = admin_subject(&f);

    // A manager role holding roles.delete, and a subject carrying it.
    let delete_perm: Vec<PermissionId> = f
        .service
        .store()
        .permissions()
        .iter()
        .filter(|p| p.name.as_str() == "roles.delete")
        .map(|p| p.id)
        .collect();
    let manager = f
        .service
        .create_role(
            &admin,
            NewRole {
                name: "manager".to_string(),
                guard: None,
                permissions: Some(delete_perm),
            },
        )
        .unwrap();
    let account = f
        .service
        .create_user(
            &admin,
            NewUser {
                name: "Mallory".to_string(),
                email: "mallory@example.com".to_string(),
                password: "password123".to_string(),
                roles: vec![manager.id],
            },
        )
        .unwrap();

    let mallory = f.service.resolve_subject(account.id).unwrap();
    assert!(mallory.has_permission("roles.delete"));

    let err = f
        .service
        .delete_role(&mallory, f.seeded.admin_role.id)
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    // The grant still works against ordinary roles.
    f.service.delete_role(&mallory, f.seeded.user_role.id).unwrap();
}

#[test]
fn only_admins_may_edit_the_admin_role() {
    let f = fixture();
    let editor = editor_subject(&f);

    let err = f
        .service
        .update_role(
            &editor,
            f.seeded.admin_role.id,
            RolePatch {
                name: Some("superadmin".to_string()),
                permissions: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let admin = admin_subject(&f);
    f.service
        .update_role(
            &admin,
            f.seeded.admin_role.id,
            RolePatch {
                name: None,
                permissions: None,
            },
        )
        .unwrap();
}

#[test]
fn toggle_active_twice_restores_the_original_value() {
    let f = fixture();
    let admin = admin_subject(&f);
    let target = f.seeded.user.id;

    let original = f.service.store().user(target).unwrap().active;
    let flipped = f.service.toggle_active(&admin, target).unwrap();
    assert_eq!(flipped, !original);
    let restored = f.service.toggle_active(&admin, target).unwrap();
    assert_eq!(restored, original);
}

#[test]
fn any_subject_may_view_and_update_themself() {
    let f = fixture();
    let user = f.service.resolve_subject(f.seeded.user.id).unwrap();
    assert!(!user.is_admin());

    f.service.get_user(&user, f.seeded.user.id).unwrap();
    f.service
        .update_user(
            &user,
            f.seeded.user.id,
            UserPatch {
                name: Some("Renamed User".to_string()),
                ..UserPatch::default()
            },
        )
        .unwrap();

    // But not other accounts.
    let err = f.service.get_user(&user, f.seeded.editor.id).unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
}

#[test]
fn self_updates_cannot_change_role_assignments() {
    let f = fixture();
    let user = f.service.resolve_subject(f.seeded.user.id).unwrap();
    assert!(!user.is_admin());

    // Granting yourself the admin role through the self-update path must
    // be refused outright.
    let err = f
        .service
        .update_user(
            &user,
            f.seeded.user.id,
            UserPatch {
                roles: Some(vec![f.seeded.admin_role.id]),
                ..UserPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let account = f.service.store().user(f.seeded.user.id).unwrap();
    assert_eq!(
        account.roles.iter().copied().collect::<Vec<_>>(),
        [f.seeded.user_role.id]
    );
    assert!(!f.service.resolve_subject(f.seeded.user.id).unwrap().is_admin());

    // Admins still reassign roles freely.
    let admin = admin_subject(&f);
    let updated = f
        .service
        .update_user(
            &admin,
            f.seeded.user.id,
            UserPatch {
                roles: Some(vec![f.seeded.editor_role.id]),
                ..UserPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.roles.len(), 1);
    assert_eq!(updated.roles[0].name, "editor");
}

#[test]
fn admins_may_never_delete_their_own_account() {
    let f = fixture();
    let admin = admin_subject(&f);

    let err = f.service.delete_user(&admin, f.seeded.admin.id).unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    f.service.delete_user(&admin, f.seeded.user.id).unwrap();
}

#[test]
fn permission_assignment_is_idempotent() {
    let f = fixture();
    let admin = admin_subject(&f);

    let ids: Vec<PermissionId> = f
        .service
        .store()
        .permissions()
        .iter()
        .take(2)
        .map(|p| p.id)
        .collect();

    let first = f
        .service
        .assign_permissions(&admin, f.seeded.editor_role.id, &ids)
        .unwrap();
    let second = f
        .service
        .assign_permissions(&admin, f.seeded.editor_role.id, &ids)
        .unwrap();
    assert_eq!(first.permissions.len(), 2);
    assert_eq!(first.permissions, second.permissions);
}

#[test]
fn blocked_account_cannot_log_in_until_unblocked() {
    let f = fixture();
    let admin = admin_subject(&f);
    let target = f.seeded.user.id;

    assert!(f.service.login("user@example.com", "password").is_some());
    assert!(f.service.login("user@example.com", "wrong").is_none());

    f.service.block(&admin, target).unwrap();
    assert!(f.service.login("user@example.com", "password").is_none());

    f.service.unblock(&admin, target).unwrap();
    assert!(f.service.login("user@example.com", "password").is_some());
}

#[test]
fn every_successful_mutation_appends_exactly_one_audit_entry() {
    let f = fixture();
    let admin = admin_subject(&f);
    let target = f.seeded.user.id;

    let before = f.audit.len();
    f.service.block(&admin, target).unwrap();
    f.service.unblock(&admin, target).unwrap();
    f.service.disable_two_factor(&admin, target).unwrap();
    f.service.force_password_reset(&admin, target).unwrap();
    assert_eq!(f.audit.len(), before + 4);

    let actions: Vec<String> = f
        .audit
        .recent(4)
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(
        actions,
        ["Forced password reset", "Disabled 2FA", "Unblocked user", "Blocked user"]
    );
}

#[test]
fn denied_operations_leave_no_audit_entry() {
    let f = fixture();
    let editor = editor_subject(&f);

    let before = f.audit.len();
    let err = f.service.block(&editor, f.seeded.admin.id).unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
    assert_eq!(f.audit.len(), before);
}

#[test]
fn missing_targets_are_not_found_even_for_denied_subjects() {
    let f = fixture();
    let editor = editor_subject(&f);

    let err = f
        .service
        .delete_user(&editor, adminkit_core::UserId::new())
        .unwrap_err();
    assert_eq!(err, DomainError::NotFound);
}

#[test]
fn forced_reset_is_cleared_by_the_password_update_path() {
    let f = fixture();
    let admin = admin_subject(&f);
    let target = f.seeded.user.id;

    f.service.force_password_reset(&admin, target).unwrap();
    assert!(f.service.store().user(target).unwrap().force_password_reset);

    f.service
        .update_password(&admin, target, "a-new-password")
        .unwrap();
    let account = f.service.store().user(target).unwrap();
    assert!(!account.force_password_reset);
    assert!(f.service.login("user@example.com", "a-new-password").is_some());
}

#[test]
fn account_creation_requires_at_least_one_role() {
    let f = fixture();
    let admin = admin_subject(&f);

    let err = f
        .service
        .create_user(
            &admin,
            NewUser {
                name: "No Roles".to_string(),
                email: "noroles@example.com".to_string(),
                password: "password123".to_string(),
                roles: vec![],
            },
        )
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[test]
fn non_admins_cannot_list_or_create_accounts() {
    let f = fixture();
    let editor = editor_subject(&f);

    assert!(matches!(
        f.service.list_users(&editor, None, 1).unwrap_err(),
        DomainError::Forbidden(_)
    ));
    assert!(matches!(
        f.service
            .create_user(
                &editor,
                NewUser {
                    name: "X".to_string(),
                    email: "x@example.com".to_string(),
                    password: "password123".to_string(),
                    roles: vec![f.seeded.user_role.id],
                },
            )
            .unwrap_err(),
        DomainError::Forbidden(_)
    ));
}

#[test]
fn dashboard_reads_are_permission_gated() {
    let f = fixture();
    let editor = editor_subject(&f);
    let admin = admin_subject(&f);

    // Editor holds dashboard.view and dashboard.stats.
    f.service.dashboard_stats(&editor).unwrap();
    f.service.dashboard_charts(&editor).unwrap();

    let stats = f.service.dashboard_stats(&admin).unwrap();
    assert_eq!(stats.total_users, 3);
    assert_eq!(stats.total_roles, 3);

    // Activity feed is admin-only.
    assert!(f.service.recent_activity(&editor, 10).is_err());
    assert!(f.service.recent_activity(&admin, 10).is_ok());
}
