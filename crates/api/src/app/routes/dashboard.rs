use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::SubjectContext;

const DEFAULT_ACTIVITY_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
}

pub fn router() -> Router {
    Router::new()
        .route("/stats", get(stats))
        .route("/charts", get(charts))
        .route("/activity", get(activity))
}

/// GET /dashboard/stats - headline counters.
pub async fn stats(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
) -> axum::response::Response {
    match services.admin.dashboard_stats(ctx.subject()) {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// GET /dashboard/charts - 30-day growth and role distribution series.
pub async fn charts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
) -> axum::response::Response {
    match services.admin.dashboard_charts(ctx.subject()) {
        Ok(charts) => (StatusCode::OK, Json(charts)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// GET /dashboard/activity?limit= - recent audit entries, admin only.
pub async fn activity(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Query(query): Query<ActivityQuery>,
) -> axum::response::Response {
    let limit = query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    match services.admin.recent_activity(ctx.subject(), limit) {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
