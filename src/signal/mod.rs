//! The signal parser (spec.md §4.2): a pure function from a raw upstream
//! message to an optional structured [`TradingSignal`].

mod confidence;
mod detect;
mod directional;
mod entry_signal;
mod extract_common;
mod funding_rate;
mod language;
mod pattern;
mod quick_target;
mod sentiment;
pub mod types;

use crate::model::{MediaFile, UpstreamMessage};
use types::{
    MediaDescriptor, MetadataBlock, SignalDetails, SignalKind, SourceBlock, TradingSignal,
};
use uuid::Uuid;

const PARSER_VERSION: &str = "1.0.0";

fn media_descriptors(files: &Option<Vec<MediaFile>>) -> Vec<MediaDescriptor> {
    files
        .as_ref()
        .map(|files| {
            files
                .iter()
                .map(|f| MediaDescriptor {
                    file_id: f.file_id.clone(),
                    file_type: f.file_type.clone(),
                    file_name: f.file_name.clone(),
                    file_size: f.file_size,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Classifies `message.text` and extracts the matching variant, or returns
/// `None` if no variant's validation passes (spec.md §4.2 "Variant
/// extraction"). Never panics and never blocks.
pub fn parse(message: &UpstreamMessage) -> Option<TradingSignal> {
    let started = std::time::Instant::now();
    let text = message.text.as_str();
    let kind = detect::detect(text)?;

    let details = match kind {
        SignalKind::StrongSignal => {
            directional::extract(text, message.message_date, 1).map(SignalDetails::StrongSignal)
        }
        SignalKind::MediumSignal => {
            directional::extract(text, message.message_date, 2).map(SignalDetails::MediumSignal)
        }
        SignalKind::Sentiment => sentiment::extract(text).map(SignalDetails::Sentiment),
        SignalKind::EntrySignal => {
            entry_signal::extract(text, message.message_date).map(SignalDetails::EntrySignal)
        }
        SignalKind::QuickTarget => {
            quick_target::extract(text, message.message_date).map(SignalDetails::QuickTarget)
        }
        SignalKind::FundingRate => funding_rate::extract(text).map(SignalDetails::FundingRate),
    }?;

    let confidence = match &details {
        SignalDetails::StrongSignal(d) | SignalDetails::MediumSignal(d) => {
            confidence::strong_medium(d)
        }
        SignalDetails::Sentiment(d) => confidence::sentiment(d),
        SignalDetails::EntrySignal(d) => confidence::entry_signal(d),
        SignalDetails::QuickTarget(d) => confidence::quick_target(d),
        SignalDetails::FundingRate(d) => confidence::funding_rate(d),
    };

    Some(TradingSignal {
        signal_id: Uuid::new_v4(),
        emitted_at: chrono::Utc::now(),
        source: SourceBlock {
            channel_name: message.chat_title.clone(),
            channel_id: message.chat_id,
            upstream_message_id: message.message_id,
            text: message.text.clone(),
            media: media_descriptors(&message.files),
        },
        metadata: MetadataBlock {
            parser_version: PARSER_VERSION.to_owned(),
            processing_duration_ms: started.elapsed().as_secs_f64() * 1000.0,
            language: language::detect(text),
            tags: Vec::new(),
        },
        confidence,
        details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UpstreamMessage;
    use chrono::{TimeZone, Utc};

    fn message_with(text: &str, date: chrono::DateTime<Utc>) -> UpstreamMessage {
        UpstreamMessage {
            message_id: 1,
            chat_id: -1001,
            chat_title: "Test Channel".into(),
            text: text.to_owned(),
            sender_name: None,
            message_date: date,
            has_media: None,
            files: None,
        }
    }

    #[test]
    fn parses_strong_signal_from_spec_scenario() {
        let text = "#BTCUSDT #StrongSignal\nBINANCE, T10:30:00 UTC\n\u{1F534}\u{1F534}**\u{2193} TREND Reversal \u{2191}** 65%\n**RSI:** 72\n**SHORT**";
        let message = message_with(text, Utc.with_ymd_and_hms(2026, 2, 28, 9, 0, 0).unwrap());
        let signal = parse(&message).unwrap();
        match &signal.details {
            types::SignalDetails::StrongSignal(d) => {
                assert_eq!(d.side, types::Side::Short);
                assert_eq!(d.pattern, types::Pattern::TrendReversal);
                assert_eq!(d.pattern_strength, rust_decimal::Decimal::from(65));
                assert_eq!(d.rsi_signal, Some(types::RsiSignal::Overbought));
            }
            other => panic!("expected strong_signal, got {other:?}"),
        }
        assert!(signal.confidence.score >= 80);
    }

    #[test]
    fn parses_funding_rate_from_spec_scenario() {
        let marker = "\u{421}\u{438}\u{433}\u{43d}\u{430}\u{43b} \u{43f}\u{43e} \u{444}\u{430}\u{43d}\u{434}\u{438}\u{43d}\u{433}\u{443}";
        let instrument_label = "\u{418}\u{43d}\u{441}\u{442}\u{440}\u{443}\u{43c}\u{435}\u{43d}\u{442}";
        let time_label = "\u{412}\u{440}\u{435}\u{43c}\u{44f}";
        let rate_label = "\u{421}\u{442}\u{430}\u{432}\u{43a}\u{430}";
        let receive_marker = "\u{41b}\u{43e}\u{43d}\u{433}\u{438} \u{43f}\u{43e}\u{43b}\u{443}\u{447}\u{430}\u{44e}\u{442}";
        let text = format!(
            "\u{26a1}\u{fe0f} {marker} (BYBIT)\n**{instrument_label}:** [BTCUSDT](https://example.com)\n**{time_label}:** 28.02.2026 10:00\n**{rate_label}:** \u{2212}0.6000%\n{receive_marker}"
        );
        let message = message_with(&text, Utc.with_ymd_and_hms(2026, 2, 28, 9, 0, 0).unwrap());
        let signal = parse(&message).unwrap();
        match &signal.details {
            types::SignalDetails::FundingRate(d) => {
                assert_eq!(d.funding_rate_pct, rust_decimal::Decimal::new(-6, 1));
                assert_eq!(d.receiver, types::Receiver::Longs);
                assert_eq!(d.recommended_action, types::Side::Long);
            }
            other => panic!("expected funding_rate, got {other:?}"),
        }
        assert!(signal.confidence.score >= 85);
    }

    #[test]
    fn non_matching_text_returns_none() {
        let message = message_with("just some chat", Utc::now());
        assert!(parse(&message).is_none());
    }

    #[test]
    fn is_pure_apart_from_signal_id_and_processing_time() {
        let text = "#BTCUSDT #StrongSignal BINANCE \u{1F7E2} **Breakout** 50% **LONG**";
        let message = message_with(text, Utc::now());
        let first = parse(&message).unwrap();
        let second = parse(&message).unwrap();
        assert_eq!(
            serde_json::to_value(&first.details).unwrap(),
            serde_json::to_value(&second.details).unwrap()
        );
        assert_eq!(first.source.channel_id, second.source.channel_id);
        assert_ne!(first.signal_id, second.signal_id);
    }
}
