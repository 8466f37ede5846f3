//! Live connection registry + recent-backlog ring (spec.md §4.6, §5 "Shared
//! resources"): one exclusive guard over both, since `broadcast` co-mutates
//! them.

use crate::model::ProcessedMessage;
use crate::signal::types::TradingSignal;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

const BACKLOG_CAPACITY: usize = 100;
const REPLAY_COUNT: usize = 10;
const CONNECTION_BUFFER: usize = 64;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Frame<'a> {
    Signal {
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<&'a ProcessedMessage>,
        #[serde(skip_serializing_if = "Option::is_none")]
        payload: Option<&'a TradingSignal>,
    },
}

struct BroadcastState {
    connections: HashMap<Uuid, mpsc::Sender<String>>,
    backlog: VecDeque<ProcessedMessage>,
}

/// Accepts persistent subscriber connections, tracks the live set, and fans
/// out `ProcessedMessage`/`TradingSignal` broadcasts (spec.md §4.6).
pub struct Broadcaster {
    state: RwLock<BroadcastState>,
    legacy_payload_envelope: bool,
}

impl Broadcaster {
    pub fn new(legacy_payload_envelope: bool) -> Self {
        Self {
            state: RwLock::new(BroadcastState {
                connections: HashMap::new(),
                backlog: VecDeque::with_capacity(BACKLOG_CAPACITY),
            }),
            legacy_payload_envelope,
        }
    }

    /// Registers a newly authenticated connection and returns its frame
    /// receiver plus a snapshot of the backlog to replay, oldest first.
    /// Registration and snapshot happen under one lock acquisition so no
    /// broadcast emitted after this call can be missed or double-replayed
    /// (spec.md §8 invariant 4).
    pub async fn register(&self, id: Uuid) -> (mpsc::Receiver<String>, Vec<ProcessedMessage>) {
        let (tx, rx) = mpsc::channel(CONNECTION_BUFFER);
        let mut state = self.state.write().await;
        state.connections.insert(id, tx);
        let backlog = state
            .backlog
            .iter()
            .rev()
            .take(REPLAY_COUNT)
            .rev()
            .cloned()
            .collect();
        (rx, backlog)
    }

    pub async fn unregister(&self, id: Uuid) {
        self.state.write().await.connections.remove(&id);
    }

    /// Appends to the ring and fans out to every writable connection; a
    /// connection whose buffer is full or closed is skipped and dropped
    /// (spec.md §4.6 `broadcast`, never blocks the producer).
    pub async fn broadcast_message(&self, message: ProcessedMessage) {
        let frame = Frame::Signal {
            data: Some(&message),
            payload: None,
        };
        let Ok(text) = serde_json::to_string(&frame) else {
            return;
        };

        let mut state = self.state.write().await;
        if state.backlog.len() >= BACKLOG_CAPACITY {
            state.backlog.pop_front();
        }
        state.backlog.push_back(message);
        send_to_all(&mut state.connections, text);
    }

    /// Emitted only when `legacy_payload_envelope` is set (spec.md §9 open
    /// question: the default envelope is `data`, `payload` stays behind a
    /// compatibility flag). Never touches the ProcessedMessage backlog.
    pub async fn broadcast_signal(&self, signal: &TradingSignal) {
        if !self.legacy_payload_envelope {
            return;
        }
        let frame = Frame::Signal {
            data: None,
            payload: Some(signal),
        };
        let Ok(text) = serde_json::to_string(&frame) else {
            return;
        };
        let mut state = self.state.write().await;
        send_to_all(&mut state.connections, text);
    }
}

fn send_to_all(connections: &mut HashMap<Uuid, mpsc::Sender<String>>, text: String) {
    connections.retain(|_, tx| tx.try_send(text.clone()).is_ok());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_message(id: i64) -> ProcessedMessage {
        ProcessedMessage {
            id,
            channel: "c".into(),
            direction: None,
            ticker: None,
            entry_price: None,
            stop_loss: None,
            take_profit: None,
            text: "t".into(),
            timestamp: Utc::now().timestamp(),
            parsed: None,
        }
    }

    #[tokio::test]
    async fn register_replays_last_ten_oldest_first() {
        let broadcaster = Broadcaster::new(false);
        for i in 0..15 {
            broadcaster.broadcast_message(sample_message(i)).await;
        }
        let (_rx, backlog) = broadcaster.register(Uuid::new_v4()).await;
        assert_eq!(backlog.len(), 10);
        assert_eq!(backlog.first().unwrap().id, 5);
        assert_eq!(backlog.last().unwrap().id, 14);
    }

    #[tokio::test]
    async fn backlog_ring_evicts_oldest_beyond_one_hundred() {
        let broadcaster = Broadcaster::new(false);
        for i in 0..150 {
            broadcaster.broadcast_message(sample_message(i)).await;
        }
        assert_eq!(broadcaster.state.read().await.backlog.len(), 100);
        assert_eq!(broadcaster.state.read().await.backlog.front().unwrap().id, 50);
    }

    #[tokio::test]
    async fn closed_receiver_is_dropped_on_next_broadcast() {
        let broadcaster = Broadcaster::new(false);
        let id = Uuid::new_v4();
        let (rx, _backlog) = broadcaster.register(id).await;
        drop(rx);
        broadcaster.broadcast_message(sample_message(1)).await;
        assert!(!broadcaster.state.read().await.connections.contains_key(&id));
    }

    #[tokio::test]
    async fn signal_frame_suppressed_unless_legacy_flag_enabled() {
        let broadcaster = Broadcaster::new(false);
        let id = Uuid::new_v4();
        let (mut rx, _backlog) = broadcaster.register(id).await;
        let signal = crate::signal::parse(&crate::model::UpstreamMessage {
            message_id: 1,
            chat_id: -1001,
            chat_title: "c".into(),
            text: "#BTCUSDT #StrongSignal BINANCE \u{1F7E2} **Breakout** 50% **LONG**".into(),
            sender_name: None,
            message_date: Utc::now(),
            has_media: None,
            files: None,
        })
        .unwrap();
        broadcaster.broadcast_signal(&signal).await;
        assert!(rx.try_recv().is_err());
    }
}
