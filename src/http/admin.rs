//! Admin-key-guarded CRUD surface (spec.md §4.7, §6): clients, channels,
//! and request-driven history backfill.

use crate::auth::is_admin_key;
use crate::http::response::ApiError;
use crate::processor::MessageProcessor;
use crate::repo::{channels, clients, messages};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    if is_admin_key(headers, &state.admin_master_key) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

// --- clients ---------------------------------------------------------

pub async fn create_client(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&state, &headers)?;
    let created = clients::create(&state.pool).await?;
    Ok(Json(json!({
        "id": created.client.id,
        "apiKey": created.api_key,
        "isActive": created.client.is_active,
        "createdAt": created.client.created_at,
    })))
}

pub async fn list_clients(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&state, &headers)?;
    let rows = clients::list(&state.pool).await?;
    let clients: Vec<_> = rows
        .into_iter()
        .map(|c| json!({ "id": c.id, "isActive": c.is_active, "createdAt": c.created_at }))
        .collect();
    Ok(Json(json!({ "clients": clients })))
}

pub async fn delete_client(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&state, &headers)?;
    if clients::delete(&state.pool, id).await? {
        Ok(Json(json!({ "deleted": true })))
    } else {
        Err(ApiError::NotFound)
    }
}

// --- channels ----------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ChannelBody {
    #[serde(rename = "chatId")]
    chat_id: i64,
    name: String,
}

pub async fn create_channel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChannelBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&state, &headers)?;
    let channel = channels::upsert(
        &state.pool,
        channels::ChannelInput {
            chat_id: body.chat_id,
            name: body.name,
        },
    )
    .await?;
    Ok(Json(json!({
        "chatId": channel.chat_id,
        "name": channel.name,
        "isActive": channel.is_active,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ListChannelsQuery {
    #[serde(default, rename = "all")]
    all: bool,
}

pub async fn list_channels(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListChannelsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&state, &headers)?;
    let rows = if query.all {
        channels::list_all(&state.pool).await?
    } else {
        channels::list_active(&state.pool).await?
    };
    let channels: Vec<_> = rows
        .into_iter()
        .map(|c| {
            json!({
                "chatId": c.chat_id,
                "name": c.name,
                "isActive": c.is_active,
                "createdAt": c.created_at,
                "updatedAt": c.updated_at,
            })
        })
        .collect();
    Ok(Json(json!({ "channels": channels })))
}

pub async fn delete_channel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(source_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&state, &headers)?;
    if channels::delete(&state.pool, source_id).await? {
        Ok(Json(json!({ "deleted": true })))
    } else {
        Err(ApiError::NotFound)
    }
}

#[derive(Debug, Deserialize)]
pub struct ToggleChannelBody {
    is_active: bool,
}

pub async fn toggle_channel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(source_id): Path<i64>,
    Json(body): Json<ToggleChannelBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&state, &headers)?;
    if channels::set_active(&state.pool, source_id, body.is_active).await? {
        Ok(Json(json!({ "chatId": source_id, "isActive": body.is_active })))
    } else {
        Err(ApiError::NotFound)
    }
}

// --- history backfill ----------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct HistoryLoadBody {
    chat_id: i64,
    limit: Option<u32>,
}

/// Drives a one-shot backfill pull with broadcasting disabled (spec.md
/// §4.5, §9): the loader shares the same processor pipeline as live
/// ingest, just with subscriber fan-out turned off.
pub async fn load_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<HistoryLoadBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&state, &headers)?;
    let processor =
        MessageProcessor::new(state.pool.clone(), std::sync::Arc::new(crate::buffer::DurableBuffer::new()))
            .with_broadcasting_disabled();
    let result = state
        .history_loader
        .load(body.chat_id, body.limit, &processor)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(serde_json::to_value(result).unwrap_or(json!({}))))
}

pub async fn delete_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(source_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&state, &headers)?;
    let deleted = messages::delete_by_channel(&state.pool, source_id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
