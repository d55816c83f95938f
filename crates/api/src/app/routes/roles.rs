//! Role management endpoints. The structural rules around the `admin` role
//! (never deletable, only editable by admins) are enforced in the policy
//! layer; these handlers only translate results.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use adminkit_core::RoleId;

use crate::app::dto::{AssignPermissionsRequest, CreateRoleRequest, ListQuery, UpdateRoleRequest};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::SubjectContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(delete))
        .route("/:id/permissions", post(assign_permissions))
}

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    match services.admin.list_roles(ctx.subject(), query.page()) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Json(req): Json<CreateRoleRequest>,
) -> axum::response::Response {
    match services.admin.create_role(ctx.subject(), req.into()) {
        Ok(role) => (StatusCode::CREATED, Json(role)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn show(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Path(id): Path<RoleId>,
) -> axum::response::Response {
    match services.admin.get_role(ctx.subject(), id) {
        Ok(role) => (StatusCode::OK, Json(role)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Path(id): Path<RoleId>,
    Json(req): Json<UpdateRoleRequest>,
) -> axum::response::Response {
    match services.admin.update_role(ctx.subject(), id, req.into()) {
        Ok(role) => (StatusCode::OK, Json(role)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Path(id): Path<RoleId>,
) -> axum::response::Response {
    match services.admin.delete_role(ctx.subject(), id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// POST /roles/:id/permissions - wholesale replace of the permission set.
/// One unknown id fails the whole request and leaves the set untouched.
pub async fn assign_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Path(id): Path<RoleId>,
    Json(req): Json<AssignPermissionsRequest>,
) -> axum::response::Response {
    match services
        .admin
        .assign_permissions(ctx.subject(), id, &req.permissions)
    {
        Ok(role) => (StatusCode::OK, Json(role)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
