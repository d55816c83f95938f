//! Account management endpoints, including the lifecycle actions
//! (toggle-active, block/unblock, disable-2fa, force-password-reset).

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;

use adminkit_core::UserId;

use crate::app::dto::{CreateUserRequest, ListQuery, UpdatePasswordRequest, UpdateUserRequest};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::SubjectContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(delete))
        .route("/:id/toggle-active", post(toggle_active))
        .route("/:id/block", post(block))
        .route("/:id/unblock", post(unblock))
        .route("/:id/disable-2fa", post(disable_two_factor))
        .route("/:id/force-password-reset", post(force_password_reset))
        .route("/:id/password", put(update_password))
}

/// GET /users?search=&page= - paginated account listing, newest first.
pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    match services
        .admin
        .list_users(ctx.subject(), query.search.as_deref(), query.page())
    {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// POST /users - create an account with at least one role.
pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Json(req): Json<CreateUserRequest>,
) -> axum::response::Response {
    match services.admin.create_user(ctx.subject(), req.into()) {
        Ok(summary) => (StatusCode::CREATED, Json(summary)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn show(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Path(id): Path<UserId>,
) -> axum::response::Response {
    match services.admin.get_user(ctx.subject(), id) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Path(id): Path<UserId>,
    Json(req): Json<UpdateUserRequest>,
) -> axum::response::Response {
    match services.admin.update_user(ctx.subject(), id, req.into()) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Path(id): Path<UserId>,
) -> axum::response::Response {
    match services.admin.delete_user(ctx.subject(), id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// POST /users/:id/toggle-active - flip the active flag, return the new value.
pub async fn toggle_active(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Path(id): Path<UserId>,
) -> axum::response::Response {
    match services.admin.toggle_active(ctx.subject(), id) {
        Ok(active) => (StatusCode::OK, Json(json!({ "active": active }))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn block(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Path(id): Path<UserId>,
) -> axum::response::Response {
    match services.admin.block(ctx.subject(), id) {
        Ok(blocked) => (StatusCode::OK, Json(json!({ "blocked": blocked }))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn unblock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Path(id): Path<UserId>,
) -> axum::response::Response {
    match services.admin.unblock(ctx.subject(), id) {
        Ok(blocked) => (StatusCode::OK, Json(json!({ "blocked": blocked }))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn disable_two_factor(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Path(id): Path<UserId>,
) -> axum::response::Response {
    match services.admin.disable_two_factor(ctx.subject(), id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn force_password_reset(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Path(id): Path<UserId>,
) -> axum::response::Response {
    match services.admin.force_password_reset(ctx.subject(), id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// PUT /users/:id/password - set a new password; clears a pending forced
/// reset.
pub async fn update_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Path(id): Path<UserId>,
    Json(req): Json<UpdatePasswordRequest>,
) -> axum::response::Response {
    match services.admin.update_password(ctx.subject(), id, &req.password) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
