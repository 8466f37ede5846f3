//! Wire/domain types shared across the ingest pipeline and the broadcast
//! surface (spec.md §3 `Message`, `ProcessedMessage`, `BufferedItem`, and
//! the upstream event payload from spec.md §6).

use crate::signal::types::TradingSignal;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFile {
    pub file_id: String,
    pub file_type: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<i64>,
}

/// A raw message as delivered by the upstream capture service, whether via
/// the live push frame or the backfill HTTP response (spec.md §6 — both
/// share the same shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamMessage {
    pub message_id: i64,
    pub chat_id: i64,
    pub chat_title: String,
    pub text: String,
    #[serde(default)]
    pub sender_name: Option<String>,
    pub message_date: DateTime<Utc>,
    #[serde(default)]
    pub has_media: Option<bool>,
    #[serde(default)]
    pub files: Option<Vec<MediaFile>>,
}

/// Flat projection of a persisted `Message` for broadcast (spec.md §3).
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedMessage {
    pub id: i64,
    pub channel: String,
    pub direction: Option<String>,
    pub ticker: Option<String>,
    #[serde(rename = "entryPrice")]
    pub entry_price: Option<f64>,
    #[serde(rename = "stopLoss")]
    pub stop_loss: Option<f64>,
    #[serde(rename = "takeProfit")]
    pub take_profit: Option<f64>,
    pub text: String,
    #[serde(rename = "timestamp_unix_seconds")]
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<TradingSignal>,
}

pub fn decimal_to_f64(value: Option<Decimal>) -> Option<f64> {
    value.and_then(|d| d.to_string().parse::<f64>().ok())
}

/// An item that failed to persist and is awaiting retry from the durable
/// buffer (spec.md §3 `BufferedItem`).
#[derive(Debug, Clone)]
pub struct BufferedItem {
    pub raw: UpstreamMessage,
    pub parsed: Option<TradingSignal>,
    pub fingerprint: String,
    pub retry_count: u32,
    pub enqueued_at: Instant,
}
