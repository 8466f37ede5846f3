//! Strong/medium signal extraction (spec.md §4.2 "strong/medium").

use super::extract_common::{color_side, exchange, rsi, rsi_signal, signal_time, ticker, timeframe};
use super::pattern;
use super::types::DirectionalSignal;
use chrono::{DateTime, Utc};

/// `priority` is 1 for strong, 2 for medium — the caller selects it.
pub fn extract(text: &str, message_date: DateTime<Utc>, priority: i32) -> Option<DirectionalSignal> {
    let ticker = ticker(text)?;
    let exchange = exchange(text)?;
    let side = color_side(text)?;
    let (pattern, pattern_strength) = pattern::extract(text)?;
    let rsi_value = rsi(text);
    Some(DirectionalSignal {
        ticker,
        exchange,
        timeframe: timeframe(text),
        pattern,
        pattern_strength,
        side,
        rsi: rsi_value,
        rsi_signal: rsi_value.map(rsi_signal),
        signal_time: signal_time(text, message_date),
        priority,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::types::{Pattern, RsiSignal, Side};
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    #[test]
    fn extracts_strong_signal_from_spec_example() {
        let text = "#BTCUSDT #StrongSignal\nBINANCE, T10:30:00 UTC\n\u{1F534}\u{1F534}**\u{2193} TREND Reversal \u{2191}** 65%\n**RSI:** 72\n**SHORT**";
        let message_date = Utc.with_ymd_and_hms(2026, 2, 28, 9, 0, 0).unwrap();
        let signal = extract(text, message_date, 1).unwrap();
        assert_eq!(signal.ticker, "BTCUSDT");
        assert_eq!(signal.side, Side::Short);
        assert_eq!(signal.pattern, Pattern::TrendReversal);
        assert_eq!(signal.pattern_strength, Decimal::from(65));
        assert_eq!(signal.rsi_signal, Some(RsiSignal::Overbought));
        assert_eq!(signal.priority, 1);
    }

    #[test]
    fn missing_side_rejects() {
        let text = "#BTCUSDT #StrongSignal BINANCE **Breakout** 50%";
        let message_date = Utc::now();
        assert!(extract(text, message_date, 1).is_none());
    }

    #[test]
    fn missing_ticker_rejects() {
        let text = "#StrongSignal BINANCE **Breakout** 50% **LONG**";
        let message_date = Utc::now();
        assert!(extract(text, message_date, 1).is_none());
    }
}
