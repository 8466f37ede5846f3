//! Subscriber credential repository (spec.md §4.1 `ClientRepo`).

use super::RepoError;
use chrono::{DateTime, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use uuid::Uuid;

const KEY_TAG: &str = "rlay";

#[derive(Debug, Clone)]
pub struct Client {
    pub id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Returned only from `create`: the raw key is never persisted or
/// retrievable again afterward, matching the invariant that API keys are
/// unique and never reused.
#[derive(Debug, Clone)]
pub struct CreatedClient {
    pub client: Client,
    pub api_key: String,
}

fn hash_key(raw_key: &str) -> String {
    hex::encode(Sha256::digest(raw_key.as_bytes()))
}

fn generate_api_key() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{KEY_TAG}{}", hex::encode(bytes))
}

fn row_to_client(row: &sqlx::postgres::PgRow) -> Client {
    Client {
        id: row.get("id"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    }
}

pub async fn create(pool: &PgPool) -> Result<CreatedClient, RepoError> {
    let id = Uuid::new_v4();
    let api_key = generate_api_key();
    let hash = hash_key(&api_key);

    let row = sqlx::query(
        r#"INSERT INTO clients (id, api_key_hash, api_key_tag, is_active)
           VALUES ($1, $2, $3, TRUE)
           RETURNING id, is_active, created_at"#,
    )
    .bind(id)
    .bind(&hash)
    .bind(KEY_TAG)
    .fetch_one(pool)
    .await?;

    Ok(CreatedClient {
        client: row_to_client(&row),
        api_key,
    })
}

/// Returns the client only if it is active; revoked/inactive keys resolve
/// to `None` just like an unknown key (spec.md §4.1).
pub async fn lookup_by_key(pool: &PgPool, raw_key: &str) -> Result<Option<Client>, RepoError> {
    let hash = hash_key(raw_key);
    let row = sqlx::query(
        "SELECT id, is_active, created_at FROM clients WHERE api_key_hash = $1 AND is_active = TRUE",
    )
    .bind(&hash)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| row_to_client(&r)))
}

pub async fn list(pool: &PgPool) -> Result<Vec<Client>, RepoError> {
    let rows = sqlx::query("SELECT id, is_active, created_at FROM clients ORDER BY created_at ASC")
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(row_to_client).collect())
}

pub async fn set_active(pool: &PgPool, id: Uuid, active: bool) -> Result<bool, RepoError> {
    let result = sqlx::query("UPDATE clients SET is_active = $1 WHERE id = $2")
        .bind(active)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, RepoError> {
    let result = sqlx::query("DELETE FROM clients WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
