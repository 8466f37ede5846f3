//! Auth validator (spec.md §4.7): resolves the admin/client principal from
//! request headers.

use crate::repo::clients;
use axum::http::HeaderMap;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Admin,
    Client(Uuid),
}

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";
pub const CLIENT_KEY_HEADER: &str = "x-api-key";

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name)?.to_str().ok().map(str::to_owned)
}

/// Resolves an admin-key or client-key header to a [`Principal`] (spec.md
/// §4.7 "validate"). Admin key takes precedence when both are present.
pub async fn resolve_principal(
    headers: &HeaderMap,
    pool: &PgPool,
    admin_master_key: &str,
) -> Option<Principal> {
    if let Some(key) = header(headers, ADMIN_KEY_HEADER) {
        if key == admin_master_key {
            return Some(Principal::Admin);
        }
    }
    if let Some(key) = header(headers, CLIENT_KEY_HEADER) {
        if let Ok(Some(client)) = clients::lookup_by_key(pool, &key).await {
            return Some(Principal::Client(client.id));
        }
    }
    None
}

/// Admin-only guard: only the master key is accepted (spec.md §4.7
/// "admin-guarded endpoints").
pub fn is_admin_key(headers: &HeaderMap, admin_master_key: &str) -> bool {
    header(headers, ADMIN_KEY_HEADER)
        .map(|k| k == admin_master_key)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn admin_key_header_matches_master_key() {
        let mut headers = HeaderMap::new();
        headers.insert(ADMIN_KEY_HEADER, HeaderValue::from_static("secret"));
        assert!(is_admin_key(&headers, "secret"));
        assert!(!is_admin_key(&headers, "other"));
    }

    #[test]
    fn missing_header_is_not_admin() {
        let headers = HeaderMap::new();
        assert!(!is_admin_key(&headers, "secret"));
    }
}
