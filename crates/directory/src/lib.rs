//! `adminkit-directory` — account/role/permission registries and the
//! policy-gated admin service.
//!
//! Every mutating operation follows the same three-step protocol:
//! policy check, then mutation, then audit append. The registries live
//! behind a single lock, so each operation is one serializable unit.

pub mod account;
pub mod dashboard;
pub mod seed;
pub mod service;
pub mod store;
pub mod views;

pub use account::Account;
pub use dashboard::{DashboardCharts, DashboardStats};
pub use seed::{SeededDirectory, seed_defaults};
pub use service::{AdminService, NewRole, NewUser, RolePatch, UserPatch};
pub use store::{DEFAULT_GUARD, DirectoryStore, PermissionRecord, RoleRecord};
pub use views::{
    AccountSummary, GroupedPermission, PAGE_SIZE, Page, PermissionBrief, RoleOverview, RoleSummary,
};
