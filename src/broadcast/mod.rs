//! Broadcaster (spec.md §4.6): live connection registry, bounded recent
//! backlog, and the subscriber WebSocket handler.

pub mod registry;
pub mod subscriber;

pub use registry::Broadcaster;
pub use subscriber::subscriber_handler;

use crate::model::ProcessedMessage;
use crate::processor::{MessageHandler, SignalHandler};
use crate::signal::types::TradingSignal;
use std::sync::Arc;

/// Bridges the processor's synchronous callback interface to the
/// broadcaster's async fan-out (spec.md §9: "the broadcaster's `broadcast`
/// must not call back into the processor, avoiding cycles"). Each callback
/// spawns the fan-out so the processor is never blocked waiting on slow
/// subscribers.
pub struct BroadcastHandlers {
    broadcaster: Arc<Broadcaster>,
}

impl BroadcastHandlers {
    pub fn new(broadcaster: Arc<Broadcaster>) -> Self {
        Self { broadcaster }
    }
}

impl MessageHandler for BroadcastHandlers {
    fn on_message(&self, message: ProcessedMessage) {
        let broadcaster = self.broadcaster.clone();
        tokio::spawn(async move { broadcaster.broadcast_message(message).await });
    }
}

impl SignalHandler for BroadcastHandlers {
    fn on_signal(&self, signal: TradingSignal) {
        let broadcaster = self.broadcaster.clone();
        tokio::spawn(async move { broadcaster.broadcast_signal(&signal).await });
    }
}
