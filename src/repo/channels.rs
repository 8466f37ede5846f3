//! Whitelisted source channel repository (spec.md §4.1 `ChannelRepo`).
//!
//! Source-ids are compared as strings at the API boundary to stay safe
//! above the 53-bit float limit some callers might funnel them through
//! (spec.md §4.3/§9), but are stored and bound here as `i64` since Postgres
//! `BIGINT` already carries the full 64-bit range.

use super::RepoError;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

#[derive(Debug, Clone)]
pub struct Channel {
    pub chat_id: i64,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct ChannelInput {
    pub chat_id: i64,
    pub name: String,
}

fn row_to_channel(row: &sqlx::postgres::PgRow) -> Channel {
    Channel {
        chat_id: row.get("chat_id"),
        name: row.get("name"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub async fn is_active(pool: &PgPool, chat_id: i64) -> Result<bool, RepoError> {
    let row = sqlx::query("SELECT is_active FROM channels WHERE chat_id = $1")
        .bind(chat_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.get::<bool, _>("is_active")).unwrap_or(false))
}

pub async fn list_active(pool: &PgPool) -> Result<Vec<Channel>, RepoError> {
    let rows = sqlx::query(
        "SELECT chat_id, name, is_active, created_at, updated_at FROM channels WHERE is_active = TRUE ORDER BY chat_id ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(row_to_channel).collect())
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Channel>, RepoError> {
    let rows = sqlx::query(
        "SELECT chat_id, name, is_active, created_at, updated_at FROM channels ORDER BY chat_id ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(row_to_channel).collect())
}

pub async fn upsert(pool: &PgPool, input: ChannelInput) -> Result<Channel, RepoError> {
    let row = sqlx::query(
        r#"INSERT INTO channels (chat_id, name) VALUES ($1, $2)
           ON CONFLICT (chat_id) DO UPDATE SET name = EXCLUDED.name, updated_at = now()
           RETURNING chat_id, name, is_active, created_at, updated_at"#,
    )
    .bind(input.chat_id)
    .bind(&input.name)
    .fetch_one(pool)
    .await?;
    Ok(row_to_channel(&row))
}

pub async fn set_active(pool: &PgPool, chat_id: i64, active: bool) -> Result<bool, RepoError> {
    let result = sqlx::query("UPDATE channels SET is_active = $1 WHERE chat_id = $2")
        .bind(active)
        .bind(chat_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, chat_id: i64) -> Result<bool, RepoError> {
    let result = sqlx::query("DELETE FROM channels WHERE chat_id = $1")
        .bind(chat_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
