//! Boots and supervises the long-running pieces of the relay: the upstream
//! connector, the periodic buffer flush, and periodic stats logging
//! (spec.md §5 "Cancellation & timeouts").

use crate::broadcast::{BroadcastHandlers, Broadcaster};
use crate::buffer::DurableBuffer;
use crate::processor::MessageProcessor;
use crate::repo::messages;
use crate::upstream::UpstreamConnector;
use sqlx::PgPool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

const BUFFER_FLUSH_INTERVAL: Duration = Duration::from_secs(30);
const STATS_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Owns the background tasks spun up at boot, so `main` can drive a clean
/// shutdown sequence: stop timers, close the upstream socket, broadcast
/// shutdown to subscribers, flush the buffer once more, then close the pool.
pub struct Supervisor {
    processor: Arc<MessageProcessor>,
    upstream: Arc<UpstreamConnector>,
    shutdown_tx: watch::Sender<bool>,
}

impl Supervisor {
    pub fn new(
        pool: PgPool,
        broadcaster: Arc<Broadcaster>,
        ws_url: String,
        ws_api_key: String,
    ) -> (Self, watch::Receiver<bool>) {
        let buffer = Arc::new(DurableBuffer::new());
        let handlers = Arc::new(BroadcastHandlers::new(broadcaster));
        let processor = Arc::new(
            MessageProcessor::new(pool, buffer)
                .with_message_handler(handlers.clone())
                .with_signal_handler(handlers),
        );
        let upstream = Arc::new(UpstreamConnector::new(ws_url, ws_api_key, processor.clone()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        (
            Self {
                processor,
                upstream,
                shutdown_tx,
            },
            shutdown_rx,
        )
    }

    /// Spawns the upstream connector and the periodic timers; returns once
    /// they're running, not once they're done.
    pub fn spawn(&self, pool: PgPool) {
        let upstream = self.upstream.clone();
        tokio::spawn(async move { upstream.run().await });

        let processor = self.processor.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(BUFFER_FLUSH_INTERVAL);
            loop {
                interval.tick().await;
                processor.flush_buffer().await;
            }
        });

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(STATS_LOG_INTERVAL);
            loop {
                interval.tick().await;
                match messages::stats(&pool).await {
                    Ok(stats) => info!(?stats, "periodic stats"),
                    Err(err) => warn!(error = %err, "stats query failed"),
                }
            }
        });
    }

    /// Graceful shutdown: stops new upstream reconnects, tells every live
    /// subscriber to close, flushes the buffer one last time.
    pub async fn shutdown(&self) {
        self.upstream.manual_close_flag().store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(true);
        self.processor.flush_buffer().await;
    }
}
