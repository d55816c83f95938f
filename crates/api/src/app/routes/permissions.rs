use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use adminkit_core::PermissionId;

use crate::app::dto::{ListQuery, PermissionRequest, UpdatePermissionRequest};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::SubjectContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/grouped", get(grouped))
        .route("/:id", get(show).put(update).delete(delete))
}

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    match services.admin.list_permissions(ctx.subject(), query.page()) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// GET /permissions/grouped - permissions grouped by resource prefix.
pub async fn grouped(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
) -> axum::response::Response {
    match services.admin.grouped_permissions(ctx.subject()) {
        Ok(groups) => (StatusCode::OK, Json(groups)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Json(req): Json<PermissionRequest>,
) -> axum::response::Response {
    match services
        .admin
        .create_permission(ctx.subject(), &req.name, req.guard)
    {
        Ok(permission) => (StatusCode::CREATED, Json(permission)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn show(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Path(id): Path<PermissionId>,
) -> axum::response::Response {
    match services.admin.get_permission(ctx.subject(), id) {
        Ok(permission) => (StatusCode::OK, Json(permission)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Path(id): Path<PermissionId>,
    Json(req): Json<UpdatePermissionRequest>,
) -> axum::response::Response {
    match services
        .admin
        .update_permission(ctx.subject(), id, req.name.as_deref(), req.guard)
    {
        Ok(permission) => (StatusCode::OK, Json(permission)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Path(id): Path<PermissionId>,
) -> axum::response::Response {
    match services.admin.delete_permission(ctx.subject(), id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
