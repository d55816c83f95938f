use std::sync::Arc;

use adminkit_audit::InMemoryAuditTrail;
use adminkit_auth::{Argon2PasswordHasher, Hs256TokenCodec};
use adminkit_directory::{AdminService, DirectoryStore, seed_defaults};

/// Shared application services injected into handlers via `Extension`.
pub struct AppServices {
    pub admin: Arc<AdminService>,
    pub tokens: Arc<Hs256TokenCodec>,
}

/// Wire the in-memory directory, audit trail, and password hasher, then
/// seed the default catalogue/roles/accounts.
pub fn build_services(jwt_secret: &str) -> AppServices {
    let store = Arc::new(DirectoryStore::default());
    let audit = Arc::new(InMemoryAuditTrail::default());
    let hasher = Arc::new(Argon2PasswordHasher::default());

    if let Err(e) = seed_defaults(&store, hasher.as_ref()) {
        // The store is empty at this point, so seeding can only fail on a
        // hasher error; surface it loudly and continue with an empty
        // directory rather than aborting the process.
        tracing::error!(error = %e, "failed to seed default directory");
    }

    let admin = Arc::new(AdminService::new(store, audit, hasher));
    let tokens = Arc::new(Hs256TokenCodec::new(jwt_secret.as_bytes()));

    AppServices { admin, tokens }
}
