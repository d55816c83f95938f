//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: infrastructure wiring (store, audit trail, hasher, tokens)
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get, routing::post};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests). Seeds the in-memory directory with the default
/// catalogue, roles, and accounts.
pub fn build_app(jwt_secret: String) -> Router {
    let services = Arc::new(services::build_services(&jwt_secret));

    let auth_state = middleware::AuthState {
        verifier: services.tokens.clone(),
        admin: services.admin.clone(),
    };

    // Protected routes: bearer token + directory-resolved subject.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/auth/login", post(routes::system::login))
        .merge(protected)
        .layer(Extension(services))
}
