//! `adminkit-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage. It knows how
//! to *decide*, never how to persist or transport.

pub mod claims;
pub mod password;
pub mod permissions;
pub mod policy;
pub mod roles;
pub mod subject;

pub use claims::{AuthClaims, Hs256TokenCodec, TokenError, TokenVerifier, validate_claims};
pub use password::{Argon2PasswordHasher, PasswordHashError, PasswordHasher};
pub use permissions::PermissionName;
pub use policy::{
    AuthzError, PermissionAction, RoleAction, UserAction, authorize_permission, authorize_role,
    authorize_user,
};
pub use roles::{ADMIN_ROLE, RoleName};
pub use subject::Subject;
