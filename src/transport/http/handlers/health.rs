use crate::domain::registry::SERVICES;
use crate::transport::http::handlers::common::ok_json;
use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy (store reachable)", body = ApiResponse),
        (status = 503, description = "Service is unhealthy (store unreachable)", body = ApiResponse)
    )
)]
pub async fn healthcheck_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.entities.read(SERVICES).await {
        Ok(_) => ok_json(json!({ "status": "ok" })),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse {
                success: false,
                data: Some(json!({ "status": "unhealthy" })),
                error: Some(format!("store ping failed: {}", e)),
            }),
        ),
    }
}
