//! `GET /health` and `GET /readyz` (spec.md §6, §10 ambient supplement).

use crate::state::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = match sqlx::query("SELECT 1").fetch_one(&state.pool).await {
        Ok(_) => "ok",
        Err(_) => "error",
    };
    Json(json!({
        "status": "ok",
        "service": "relay",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "checks": { "database": database },
    }))
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").fetch_one(&state.pool).await {
        Ok(_) => (axum::http::StatusCode::OK, "ok"),
        Err(_) => (axum::http::StatusCode::SERVICE_UNAVAILABLE, "not ready"),
    }
}
