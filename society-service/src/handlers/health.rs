use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::services::metrics::get_metrics;
use crate::AppState;

/// GET / - service welcome message.
pub async fn welcome() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to NeighbourNet API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Liveness probe, including a store ping.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.workflow.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "society-service",
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "service": "society-service",
                "error": e.to_string()
            })),
        ),
    }
}

pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.workflow.health_check().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub async fn metrics() -> impl IntoResponse {
    get_metrics()
}
