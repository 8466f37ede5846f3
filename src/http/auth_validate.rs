//! `GET /api/auth/validate` (spec.md §4.7, §6).

use crate::auth::{resolve_principal, Principal};
use crate::state::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub async fn validate(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    match resolve_principal(&headers, &state.pool, &state.admin_master_key).await {
        Some(Principal::Admin) => {
            (axum::http::StatusCode::OK, Json(json!({ "valid": true, "role": "admin" })))
        }
        Some(Principal::Client(id)) => (
            axum::http::StatusCode::OK,
            Json(json!({ "valid": true, "role": "client", "clientId": id })),
        ),
        None => (
            axum::http::StatusCode::UNAUTHORIZED,
            Json(json!({ "valid": false, "error": "invalid or missing key" })),
        ),
    }
}
