use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use chrono::{Duration, Utc};
use serde_json::json;

use adminkit_auth::AuthClaims;

use crate::app::dto::LoginRequest;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::SubjectContext;

const TOKEN_TTL_MINUTES: i64 = 60;

/// GET /health - unauthenticated liveness probe.
pub async fn health() -> axum::response::Response {
    (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
}

/// POST /auth/login - credential check plus the account-state gate.
///
/// A bad password and a blocked/deactivated account produce the same
/// response, so the endpoint leaks nothing about which one failed.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(req): Json<LoginRequest>,
) -> axum::response::Response {
    let Some(account) = services.admin.login(&req.email, &req.password) else {
        return errors::json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid credentials",
        );
    };

    let now = Utc::now();
    let claims = AuthClaims {
        sub: account.id,
        issued_at: now,
        expires_at: now + Duration::minutes(TOKEN_TTL_MINUTES),
    };

    match services.tokens.issue(&claims) {
        Ok(token) => (
            StatusCode::OK,
            Json(json!({
                "token": token,
                "token_type": "Bearer",
                "expires_at": claims.expires_at,
                "force_password_reset": account.force_password_reset,
            })),
        )
            .into_response(),
        Err(e) => errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "token_error",
            e.to_string(),
        ),
    }
}

/// GET /whoami - echo the resolved subject.
pub async fn whoami(Extension(subject): Extension<SubjectContext>) -> axum::response::Response {
    let subject = subject.subject();
    let mut permissions: Vec<&str> = subject.permissions().iter().map(String::as_str).collect();
    permissions.sort_unstable();

    (
        StatusCode::OK,
        Json(json!({
            "user_id": subject.user_id(),
            "roles": subject.roles(),
            "permissions": permissions,
        })),
    )
        .into_response()
}
