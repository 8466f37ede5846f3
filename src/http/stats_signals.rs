//! `GET /api/stats`, `GET /api/signals` and their admin-mirrored equivalents
//! (spec.md §4.7, §6).

use crate::auth::{resolve_principal, Principal};
use crate::http::response::ApiError;
use crate::repo::messages;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    limit: Option<i64>,
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Either principal (admin or an active client) may call this — spec.md
/// §4.7 only guards the `/admin/*` mirrors to the admin key.
async fn require_any_principal(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Principal, ApiError> {
    resolve_principal(headers, &state.pool, &state.admin_master_key)
        .await
        .ok_or(ApiError::Unauthorized)
}

pub async fn stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_any_principal(&state, &headers).await?;
    let stats = messages::stats(&state.pool).await?;
    Ok(Json(json!({
        "total": stats.total,
        "today": stats.today,
        "withTicker": stats.with_ticker,
        "longCount": stats.long_count,
        "shortCount": stats.short_count,
    })))
}

pub async fn signals(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<LimitQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_any_principal(&state, &headers).await?;
    let rows = messages::get_recent(&state.pool, clamp_limit(query.limit)).await?;
    let signals: Vec<&serde_json::Value> = rows.iter().filter_map(|m| m.parsed_signal.as_ref()).collect();
    Ok(Json(json!({ "signals": signals })))
}

pub async fn admin_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !crate::auth::is_admin_key(&headers, &state.admin_master_key) {
        return Err(ApiError::Unauthorized);
    }
    let stats = messages::stats(&state.pool).await?;
    Ok(Json(json!({
        "total": stats.total,
        "today": stats.today,
        "withTicker": stats.with_ticker,
        "longCount": stats.long_count,
        "shortCount": stats.short_count,
    })))
}

pub async fn admin_signals(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<LimitQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !crate::auth::is_admin_key(&headers, &state.admin_master_key) {
        return Err(ApiError::Unauthorized);
    }
    let rows = messages::get_recent(&state.pool, clamp_limit(query.limit)).await?;
    let signals: Vec<&serde_json::Value> = rows.iter().filter_map(|m| m.parsed_signal.as_ref()).collect();
    Ok(Json(json!({ "signals": signals })))
}
