//! Chat signal relay: ingests upstream chat messages, extracts structured
//! trading signals, persists them, and fans them out to live subscribers.

pub mod auth;
pub mod broadcast;
pub mod buffer;
pub mod config;
pub mod db;
pub mod error;
pub mod history;
pub mod http;
pub mod model;
pub mod processor;
pub mod repo;
pub mod signal;
pub mod state;
pub mod supervisor;
pub mod upstream;

use axum::routing::{delete, get, patch, post};
use axum::Router;
use state::AppState;

/// Wires every route onto the shared [`AppState`] (spec.md §6 endpoint
/// table).
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(broadcast::subscriber_handler))
        .route("/health", get(http::health::health))
        .route("/readyz", get(http::health::readyz))
        .route("/api/auth/validate", get(http::auth_validate::validate))
        .route("/api/stats", get(http::stats_signals::stats))
        .route("/api/signals", get(http::stats_signals::signals))
        .route(
            "/admin/clients",
            post(http::admin::create_client).get(http::admin::list_clients),
        )
        .route("/admin/clients/:id", delete(http::admin::delete_client))
        .route(
            "/admin/channels",
            post(http::admin::create_channel).get(http::admin::list_channels),
        )
        .route("/admin/channels/:sourceId", delete(http::admin::delete_channel))
        .route(
            "/admin/channels/:sourceId/toggle",
            patch(http::admin::toggle_channel),
        )
        .route("/admin/stats", get(http::stats_signals::admin_stats))
        .route("/admin/signals", get(http::stats_signals::admin_signals))
        .route("/admin/history/load", post(http::admin::load_history))
        .route("/admin/history/:sourceId", delete(http::admin::delete_history))
        .with_state(state)
}
