//! Persisted message repository (spec.md §4.1 `MessageRepo`).

use super::RepoError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};

#[derive(Debug, Clone)]
pub struct Message {
    pub id: i64,
    pub unique_hash: String,
    pub channel_id: i64,
    pub direction: Option<String>,
    pub ticker: Option<String>,
    pub entry_price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub content_text: String,
    pub original_timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub parsed_signal: Option<serde_json::Value>,
}

pub struct MessageInput {
    pub unique_hash: String,
    pub channel_id: i64,
    pub direction: Option<String>,
    pub ticker: Option<String>,
    pub entry_price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub content_text: String,
    pub original_timestamp: DateTime<Utc>,
    pub parsed_signal: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct MessageStats {
    pub total: i64,
    pub today: i64,
    pub with_ticker: i64,
    pub long_count: i64,
    pub short_count: i64,
}

fn row_to_message(row: &sqlx::postgres::PgRow) -> Message {
    Message {
        id: row.get("id"),
        unique_hash: row.get("unique_hash"),
        channel_id: row.get("channel_id"),
        direction: row.get("direction"),
        ticker: row.get("ticker"),
        entry_price: row.get("entry_price"),
        stop_loss: row.get("stop_loss"),
        take_profit: row.get("take_profit"),
        content_text: row.get("content_text"),
        original_timestamp: row.get("original_timestamp"),
        created_at: row.get("created_at"),
        parsed_signal: row.get("parsed_signal"),
    }
}

pub async fn exists(pool: &PgPool, fingerprint: &str) -> Result<bool, RepoError> {
    let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM messages WHERE unique_hash = $1) AS present")
        .bind(fingerprint)
        .fetch_one(pool)
        .await?;
    Ok(row.get::<bool, _>("present"))
}

/// Returns `None` when the fingerprint already existed (ON CONFLICT DO
/// NOTHING, no row returned) — a race-lost duplicate, not an error.
pub async fn save(pool: &PgPool, input: MessageInput) -> Result<Option<Message>, RepoError> {
    let row = sqlx::query(
        r#"INSERT INTO messages
             (unique_hash, channel_id, direction, ticker, entry_price, stop_loss, take_profit,
              content_text, original_timestamp, parsed_signal)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
           ON CONFLICT (unique_hash) DO NOTHING
           RETURNING id, unique_hash, channel_id, direction, ticker, entry_price, stop_loss,
                     take_profit, content_text, original_timestamp, created_at, parsed_signal"#,
    )
    .bind(&input.unique_hash)
    .bind(input.channel_id)
    .bind(&input.direction)
    .bind(&input.ticker)
    .bind(input.entry_price)
    .bind(input.stop_loss)
    .bind(input.take_profit)
    .bind(&input.content_text)
    .bind(input.original_timestamp)
    .bind(&input.parsed_signal)
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(row_to_message))
}

pub async fn get_recent(pool: &PgPool, limit: i64) -> Result<Vec<Message>, RepoError> {
    let rows = sqlx::query(
        r#"SELECT id, unique_hash, channel_id, direction, ticker, entry_price, stop_loss,
                  take_profit, content_text, original_timestamp, created_at, parsed_signal
           FROM messages ORDER BY id DESC LIMIT $1"#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(row_to_message).collect())
}

/// Deletes all messages for a channel without deleting the channel row
/// itself (distinct from channel deletion's cascade).
pub async fn delete_by_channel(pool: &PgPool, channel_id: i64) -> Result<u64, RepoError> {
    let result = sqlx::query("DELETE FROM messages WHERE channel_id = $1")
        .bind(channel_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn stats(pool: &PgPool) -> Result<MessageStats, RepoError> {
    let row = sqlx::query(
        r#"SELECT
             COUNT(*) AS total,
             COUNT(*) FILTER (WHERE created_at >= now() - interval '24 hours') AS today,
             COUNT(*) FILTER (WHERE ticker IS NOT NULL OR parsed_signal ->> 'ticker' IS NOT NULL) AS with_ticker,
             COUNT(*) FILTER (
               WHERE direction = 'LONG' OR (parsed_signal -> 'direction' ->> 'side') = 'long'
             ) AS long_count,
             COUNT(*) FILTER (
               WHERE direction = 'SHORT' OR (parsed_signal -> 'direction' ->> 'side') = 'short'
             ) AS short_count
           FROM messages"#,
    )
    .fetch_one(pool)
    .await?;

    Ok(MessageStats {
        total: row.get("total"),
        today: row.get("today"),
        with_ticker: row.get("with_ticker"),
        long_count: row.get("long_count"),
        short_count: row.get("short_count"),
    })
}
