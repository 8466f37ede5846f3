//! Upstream connector (spec.md §4.4): long-lived push client to the capture
//! service, reconnecting with exponential backoff.

use crate::model::UpstreamMessage;
use crate::processor::MessageProcessor;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, warn};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum UpstreamFrame {
    NewMessage {
        message: UpstreamMessage,
    },
    /// Edits and deletions are dropped on arrival (spec.md §4.4); the
    /// payload is parsed only to confirm the frame shape, never read.
    #[allow(dead_code)]
    MessageEdited {
        message: Option<UpstreamMessage>,
    },
    #[allow(dead_code)]
    MessagesDeleted {
        messages: Option<Vec<i64>>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("websocket error: {0}")]
    Ws(String),
}

/// Owns reconnection state for a single upstream subscription.
pub struct UpstreamConnector {
    ws_url: String,
    api_key: String,
    processor: Arc<MessageProcessor>,
    manual_close: Arc<AtomicBool>,
}

impl UpstreamConnector {
    pub fn new(ws_url: String, api_key: String, processor: Arc<MessageProcessor>) -> Self {
        Self {
            ws_url,
            api_key,
            processor,
            manual_close: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag the connector for shutdown; the current run loop exits after
    /// its next failed attempt instead of reconnecting (spec.md §5).
    pub fn manual_close_flag(&self) -> Arc<AtomicBool> {
        self.manual_close.clone()
    }

    /// Runs forever until `manual_close` is set, reconnecting with
    /// exponential backoff starting at 1 s, doubling, capped at 60 s, reset
    /// to 1 s on every successful `open`.
    pub async fn run(&self) {
        let mut backoff = INITIAL_BACKOFF;
        loop {
            if self.manual_close.load(Ordering::Acquire) {
                return;
            }
            match self.run_once().await {
                Ok(()) => {
                    backoff = INITIAL_BACKOFF;
                }
                Err(err) => {
                    warn!(error = %err, "upstream connection lost");
                }
            }
            if self.manual_close.load(Ordering::Acquire) {
                return;
            }
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    async fn run_once(&self) -> Result<(), UpstreamError> {
        let mut request = self
            .ws_url
            .as_str()
            .into_client_request()
            .map_err(|e| UpstreamError::Connect(e.to_string()))?;
        request.headers_mut().insert(
            "X-Api-Key",
            self.api_key
                .parse()
                .map_err(|_| UpstreamError::Connect("invalid api key header value".into()))?,
        );

        let (mut ws, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| UpstreamError::Connect(e.to_string()))?;
        info!("upstream connection established");

        while let Some(message) = ws.next().await {
            if self.manual_close.load(Ordering::Acquire) {
                let _ = ws.close(None).await;
                return Ok(());
            }
            match message {
                Ok(Message::Text(text)) => self.dispatch(&text).await,
                Ok(Message::Ping(payload)) => {
                    let _ = ws.send(Message::Pong(payload)).await;
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(err) => return Err(UpstreamError::Ws(err.to_string())),
            }
        }
        Ok(())
    }

    async fn dispatch(&self, text: &str) {
        match serde_json::from_str::<UpstreamFrame>(text) {
            Ok(UpstreamFrame::NewMessage { message }) => {
                self.processor.process(message).await;
            }
            Ok(UpstreamFrame::MessageEdited { .. }) => {
                debug!("message_edited event dropped");
            }
            Ok(UpstreamFrame::MessagesDeleted { .. }) => {
                debug!("messages_deleted event dropped");
            }
            Err(err) => {
                warn!(error = %err, "malformed upstream frame, dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_message_frame_deserializes() {
        let raw = r#"{"type":"new_message","message":{"message_id":1,"chat_id":-1001,"chat_title":"c","text":"t","message_date":"2026-01-01T00:00:00Z"}}"#;
        let frame: UpstreamFrame = serde_json::from_str(raw).unwrap();
        assert!(matches!(frame, UpstreamFrame::NewMessage { .. }));
    }

    #[test]
    fn messages_deleted_frame_deserializes() {
        let raw = r#"{"type":"messages_deleted","messages":[1,2,3]}"#;
        let frame: UpstreamFrame = serde_json::from_str(raw).unwrap();
        assert!(matches!(frame, UpstreamFrame::MessagesDeleted { .. }));
    }

    #[test]
    fn backoff_doubles_and_caps_at_sixty_seconds() {
        let mut backoff = INITIAL_BACKOFF;
        for _ in 0..10 {
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
        assert_eq!(backoff, MAX_BACKOFF);
    }
}
