use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use adminkit_core::DomainError;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg)
        }
        DomainError::DuplicateName(name) => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "duplicate_name",
            format!("the name '{name}' is already taken"),
        ),
        DomainError::InvalidReference(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_reference", msg)
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
