//! Wired-up application state (spec.md §9 "Re-architect as an explicit
//! dependency passed into each repository at construction").

use crate::broadcast::Broadcaster;
use crate::config::Config;
use crate::history::HistoryLoader;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub broadcaster: Arc<Broadcaster>,
    pub admin_master_key: Arc<str>,
    pub history_loader: Arc<HistoryLoader>,
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    /// `broadcaster` must be the same instance the supervisor wired into
    /// the processor, so live signal emission reaches subscriber sockets.
    pub fn new(
        pool: PgPool,
        cfg: &Config,
        broadcaster: Arc<Broadcaster>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            pool,
            broadcaster,
            admin_master_key: Arc::from(cfg.admin_master_key.as_str()),
            history_loader: Arc::new(HistoryLoader::new(
                history_base_url(&cfg.upstream_ws_url),
                cfg.upstream_api_key.clone(),
            )),
            shutdown,
        }
    }
}

/// The capture service exposes both the live WS push feed and the HTTP
/// backfill endpoint on the same host (spec.md §4.5); derive the latter's
/// base URL from the configured WS URL scheme.
fn history_base_url(ws_url: &str) -> String {
    if let Some(rest) = ws_url.strip_prefix("wss://") {
        format!("https://{rest}")
    } else if let Some(rest) = ws_url.strip_prefix("ws://") {
        format!("http://{rest}")
    } else {
        ws_url.to_owned()
    }
}
