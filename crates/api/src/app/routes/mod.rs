use axum::Router;

pub mod dashboard;
pub mod permissions;
pub mod roles;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", axum::routing::get(system::whoami))
        .nest("/users", users::router())
        .nest("/roles", roles::router())
        .nest("/permissions", permissions::router())
        .nest("/dashboard", dashboard::router())
}
