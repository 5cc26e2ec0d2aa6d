//! System handlers: health and OpenAPI.

use crate::api::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

/// GET /health - Health check
///
/// Verifies the provider session is alive and reports task counts. A dead
/// session yields 503 so load balancers stop routing download traffic here.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy and the provider session is alive"),
        (status = 503, description = "Provider session is unusable")
    )
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.depot.provider().identity().await {
        Ok(me) => {
            let stats = state.depot.stats();
            (
                StatusCode::OK,
                Json(json!({
                    "status": "healthy",
                    "version": env!("CARGO_PKG_VERSION"),
                    "user": me.to_string(),
                    "active_tasks": stats.processing,
                    "total_tasks": stats.total,
                })),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "error": e.to_string(),
                })),
            )
        }
    }
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI 3.1 specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}
