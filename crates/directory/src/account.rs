//! User account entity and its lifecycle flags.
//!
//! The authentication-relevant state is a small composite of independent
//! flags, not an exclusive state machine: `active`, `blocked`,
//! `force_password_reset`, and the two-factor pair.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adminkit_core::{Entity, RoleId, UserId};

/// A user account.
///
/// # Invariants
/// - `email` is unique across the directory (enforced by the store).
/// - An account always holds at least one role at creation time.
/// - Login is permitted only while `active && !blocked`, evaluated after
///   the credential check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Write-only credential hash; never exposed through read models.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub active: bool,
    pub blocked: bool,
    pub force_password_reset: bool,
    pub two_factor_secret: Option<String>,
    pub two_factor_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub roles: BTreeSet<RoleId>,
}

impl Account {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        roles: BTreeSet<RoleId>,
    ) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            active: true,
            blocked: false,
            force_password_reset: false,
            two_factor_secret: None,
            two_factor_confirmed_at: None,
            created_at: Utc::now(),
            roles,
        }
    }

    /// Flip `active` and return the new value.
    pub fn toggle_active(&mut self) -> bool {
        self.active = !self.active;
        self.active
    }

    /// Idempotent: blocking a blocked account is not an error.
    pub fn block(&mut self) {
        self.blocked = true;
    }

    pub fn unblock(&mut self) {
        self.blocked = false;
    }

    /// Clears both halves of the two-factor pair unconditionally.
    pub fn disable_two_factor(&mut self) {
        self.two_factor_secret = None;
        self.two_factor_confirmed_at = None;
    }

    pub fn force_password_reset(&mut self) {
        self.force_password_reset = true;
    }

    /// Store a new credential hash. The normal password-update flow clears
    /// a pending forced reset.
    pub fn set_password(&mut self, hash: impl Into<String>) {
        self.password_hash = hash.into();
        self.force_password_reset = false;
    }

    /// Account-state half of the login decision; credentials are checked
    /// separately, and first.
    pub fn login_permitted(&self) -> bool {
        self.active && !self.blocked
    }

    pub fn two_factor_confirmed(&self) -> bool {
        self.two_factor_secret.is_some() && self.two_factor_confirmed_at.is_some()
    }
}

impl Entity for Account {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn account() -> Account {
        Account::new("Alice", "alice@example.com", "hash", BTreeSet::new())
    }

    #[test]
    fn defaults_are_active_unblocked() {
        let a = account();
        assert!(a.active);
        assert!(!a.blocked);
        assert!(!a.force_password_reset);
        assert!(!a.two_factor_confirmed());
        assert!(a.login_permitted());
    }

    #[test]
    fn toggle_active_twice_restores_original() {
        let mut a = account();
        let original = a.active;
        a.toggle_active();
        a.toggle_active();
        assert_eq!(a.active, original);
    }

    #[test]
    fn block_is_idempotent() {
        let mut a = account();
        a.block();
        a.block();
        assert!(a.blocked);
        a.unblock();
        a.unblock();
        assert!(!a.blocked);
    }

    #[test]
    fn blocked_or_inactive_account_cannot_log_in() {
        let mut a = account();
        a.block();
        assert!(!a.login_permitted());
        a.unblock();
        assert!(a.login_permitted());
        a.toggle_active();
        assert!(!a.login_permitted());
    }

    #[test]
    fn disable_two_factor_clears_both_fields() {
        let mut a = account();
        a.two_factor_secret = Some("secret".into());
        a.two_factor_confirmed_at = Some(Utc::now());
        assert!(a.two_factor_confirmed());

        a.disable_two_factor();
        assert!(a.two_factor_secret.is_none());
        assert!(a.two_factor_confirmed_at.is_none());
    }

    #[test]
    fn password_update_clears_forced_reset() {
        let mut a = account();
        a.force_password_reset();
        assert!(a.force_password_reset);

        a.set_password("new-hash");
        assert!(!a.force_password_reset);
        assert_eq!(a.password_hash, "new-hash");
    }

    proptest! {
        /// Property: an even number of toggles is the identity on `active`.
        #[test]
        fn even_toggles_are_identity(toggles in 0usize..32) {
            let mut a = account();
            let original = a.active;
            for _ in 0..(toggles * 2) {
                a.toggle_active();
            }
            prop_assert_eq!(a.active, original);
        }
    }
}
