//! Request DTOs. Responses reuse the directory's serializable view types.

use serde::Deserialize;

use adminkit_core::{PermissionId, RoleId};
use adminkit_directory::{NewRole, NewUser, RolePatch, UserPatch};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<usize>,
}

impl ListQuery {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub roles: Vec<RoleId>,
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        NewUser {
            name: req.name,
            email: req.email,
            password: req.password,
            roles: req.roles,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub roles: Option<Vec<RoleId>>,
}

impl From<UpdateUserRequest> for UserPatch {
    fn from(req: UpdateUserRequest) -> Self {
        UserPatch {
            name: req.name,
            email: req.email,
            password: req.password,
            roles: req.roles,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub guard: Option<String>,
    pub permissions: Option<Vec<PermissionId>>,
}

impl From<CreateRoleRequest> for NewRole {
    fn from(req: CreateRoleRequest) -> Self {
        NewRole {
            name: req.name,
            guard: req.guard,
            permissions: req.permissions,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub permissions: Option<Vec<PermissionId>>,
}

impl From<UpdateRoleRequest> for RolePatch {
    fn from(req: UpdateRoleRequest) -> Self {
        RolePatch {
            name: req.name,
            permissions: req.permissions,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignPermissionsRequest {
    pub permissions: Vec<PermissionId>,
}

#[derive(Debug, Deserialize)]
pub struct PermissionRequest {
    pub name: String,
    pub guard: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePermissionRequest {
    pub name: Option<String>,
    pub guard: Option<String>,
}
