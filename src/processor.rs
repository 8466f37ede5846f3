//! Message processor (spec.md §4.3): normalize → whitelist → dedupe →
//! parse → persist → emit, with buffer-on-failure.

use crate::buffer::DurableBuffer;
use crate::model::{decimal_to_f64, BufferedItem, ProcessedMessage, UpstreamMessage};
use crate::repo::channels;
use crate::repo::messages::{self, MessageInput};
use crate::signal::{self, types::TradingSignal};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Handles a successfully persisted, filtered message (spec.md §4.3 step 6).
pub trait MessageHandler: Send + Sync {
    fn on_message(&self, message: ProcessedMessage);
}

/// Handles the parsed signal document alongside the message, when present.
pub trait SignalHandler: Send + Sync {
    fn on_signal(&self, signal: TradingSignal);
}

/// Normalizes a raw upstream source-id to the canonical 13-digit negative
/// supergroup form (spec.md §4.3 step 1 / §8 boundary behavior).
pub fn normalize_source_id(raw: i64) -> i64 {
    if raw > 0 {
        -1_000_000_000_000 - raw
    } else if raw < 0 && raw.to_string().len() < 13 {
        -1_000_000_000_000 - raw.abs()
    } else {
        raw
    }
}

pub fn fingerprint(normalized_source_id: i64, upstream_message_id: i64) -> String {
    format!("{normalized_source_id}_{upstream_message_id}")
}

#[derive(Debug, Clone, Default)]
pub struct ProcessOutcome {
    pub persisted: bool,
}

pub struct MessageProcessor {
    pool: PgPool,
    buffer: Arc<DurableBuffer>,
    broadcasting_enabled: bool,
    message_handler: Option<Arc<dyn MessageHandler>>,
    signal_handler: Option<Arc<dyn SignalHandler>>,
}

impl MessageProcessor {
    pub fn new(pool: PgPool, buffer: Arc<DurableBuffer>) -> Self {
        Self {
            pool,
            buffer,
            broadcasting_enabled: true,
            message_handler: None,
            signal_handler: None,
        }
    }

    /// Used by the history loader: backfills must not spam live subscribers
    /// (spec.md §4.5, §9 "gate the callbacks behind the same flag").
    pub fn with_broadcasting_disabled(mut self) -> Self {
        self.broadcasting_enabled = false;
        self
    }

    pub fn with_message_handler(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        self.message_handler = Some(handler);
        self
    }

    pub fn with_signal_handler(mut self, handler: Arc<dyn SignalHandler>) -> Self {
        self.signal_handler = Some(handler);
        self
    }

    pub async fn process(&self, upstream: UpstreamMessage) -> ProcessOutcome {
        let normalized = normalize_source_id(upstream.chat_id);

        match channels::is_active(&self.pool, normalized).await {
            Ok(false) => return ProcessOutcome::default(),
            Err(err) => {
                self.buffer_and_flush(upstream, None, normalized).await;
                warn!(error = %err, "whitelist check failed, buffered for retry");
                return ProcessOutcome::default();
            }
            Ok(true) => {}
        }

        let fp = fingerprint(normalized, upstream.message_id);
        match messages::exists(&self.pool, &fp).await {
            Ok(true) => return ProcessOutcome::default(),
            Err(err) => {
                self.buffer_and_flush(upstream, None, normalized).await;
                warn!(error = %err, "dedupe check failed, buffered for retry");
                return ProcessOutcome::default();
            }
            Ok(false) => {}
        }

        let parsed = signal::parse(&upstream);
        let input = build_message_input(&upstream, normalized, &fp, parsed.as_ref());

        let saved = match messages::save(&self.pool, input).await {
            Ok(saved) => saved,
            Err(err) => {
                self.buffer_and_flush(upstream, parsed, normalized).await;
                warn!(error = %err, "persist failed, buffered for retry");
                return ProcessOutcome::default();
            }
        };

        let Some(message) = saved else {
            debug!(fingerprint = %fp, "race-lost duplicate, dropped");
            return ProcessOutcome::default();
        };

        if self.broadcasting_enabled {
            if let Some(handler) = &self.message_handler {
                handler.on_message(ProcessedMessage {
                    id: message.id,
                    channel: upstream.chat_title.clone(),
                    direction: message.direction.clone(),
                    ticker: message.ticker.clone(),
                    entry_price: decimal_to_f64(message.entry_price),
                    stop_loss: decimal_to_f64(message.stop_loss),
                    take_profit: decimal_to_f64(message.take_profit),
                    text: message.content_text.clone(),
                    timestamp: message.original_timestamp.timestamp(),
                    parsed: None,
                });
            }
            if let (Some(handler), Some(parsed)) = (&self.signal_handler, parsed) {
                handler.on_signal(parsed);
            }
        }

        ProcessOutcome { persisted: true }
    }

    async fn buffer_and_flush(
        &self,
        raw: UpstreamMessage,
        parsed: Option<TradingSignal>,
        normalized: i64,
    ) {
        let fp = fingerprint(normalized, raw.message_id);
        self.buffer.push(BufferedItem {
            raw,
            parsed,
            fingerprint: fp,
            retry_count: 0,
            enqueued_at: Instant::now(),
        });
        self.flush_buffer().await;
    }

    /// Retries every buffered item once against the store (spec.md §4.3
    /// "Buffer semantics"), invoked after a live-processing failure and by
    /// the periodic 30 s timer. Replays the whole whitelist → dedupe →
    /// persist chain rather than jumping straight to persist, since the
    /// original failure may have been at the whitelist or dedupe step.
    pub async fn flush_buffer(&self) {
        let pool = self.pool.clone();
        self.buffer
            .flush(move |item| {
                let pool = pool.clone();
                async move {
                    let normalized = normalize_source_id(item.raw.chat_id);
                    match channels::is_active(&pool, normalized).await {
                        Ok(false) => return true,
                        Err(_) => return false,
                        Ok(true) => {}
                    }
                    let fp = item.fingerprint.clone();
                    match messages::exists(&pool, &fp).await {
                        Ok(true) => return true,
                        Err(_) => return false,
                        Ok(false) => {}
                    }
                    let input = build_message_input(&item.raw, normalized, &fp, item.parsed.as_ref());
                    matches!(messages::save(&pool, input).await, Ok(Some(_)) | Ok(None))
                }
            })
            .await;
    }
}

fn build_message_input(
    upstream: &UpstreamMessage,
    normalized: i64,
    fingerprint: &str,
    parsed: Option<&TradingSignal>,
) -> MessageInput {
    let (direction, ticker, entry_price, stop_loss, take_profit, parsed_signal) = match parsed {
        Some(signal) => {
            let side = signal.details.side();
            let direction = match side {
                crate::signal::types::Side::Long => Some("LONG".to_owned()),
                crate::signal::types::Side::Short => Some("SHORT".to_owned()),
                crate::signal::types::Side::Neutral => None,
            };
            let ticker = signal.details.ticker().map(|t| t.to_owned());
            let (entry_price, stop_loss, take_profit) = legacy_prices(signal);
            (
                direction,
                ticker,
                entry_price,
                stop_loss,
                take_profit,
                serde_json::to_value(signal).ok(),
            )
        }
        None => (None, None, None, None, None, None),
    };

    MessageInput {
        unique_hash: fingerprint.to_owned(),
        channel_id: normalized,
        direction,
        ticker,
        entry_price,
        stop_loss,
        take_profit,
        content_text: upstream.text.clone(),
        original_timestamp: upstream.message_date,
        parsed_signal,
    }
}

/// Legacy column projection (spec.md §4.3 step 5): stop-loss uses the
/// *stop_0_5* variant, take-profit the first target.
fn legacy_prices(
    signal: &TradingSignal,
) -> (
    Option<rust_decimal::Decimal>,
    Option<rust_decimal::Decimal>,
    Option<rust_decimal::Decimal>,
) {
    use crate::signal::types::SignalDetails;
    match &signal.details {
        SignalDetails::EntrySignal(d) => (
            Some(d.entry_price),
            d.stop_0_5,
            d.targets.first().copied(),
        ),
        SignalDetails::QuickTarget(d) => (Some(d.entry_price), None, d.targets.first().copied()),
        _ => (None, None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_small_positive_source_id() {
        assert_eq!(normalize_source_id(123), -1_000_000_000_123);
    }

    #[test]
    fn normalizes_short_negative_source_id() {
        assert_eq!(normalize_source_id(-123), -1_000_000_000_123);
    }

    #[test]
    fn leaves_already_qualified_source_id_unchanged() {
        assert_eq!(normalize_source_id(-1_002_678_035_223), -1_002_678_035_223);
    }

    #[test]
    fn fingerprint_combines_normalized_id_and_message_id() {
        assert_eq!(fingerprint(-1_000_000_000_123, 42), "-1000000000123_42");
    }
}
