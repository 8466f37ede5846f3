//! Entry signal extraction (spec.md §4.2 "entry_signal").

use super::extract_common::{color_side, exchange, signal_time, ticker, timeframe};
use super::types::EntrySignalData;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;

fn entry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*Entry:\*\*\s*(-?\d+(?:\.\d+)?)").unwrap())
}

fn targets_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*Targets:\*\*\s*([^\n\r]+)").unwrap())
}

fn stop_0_5_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*Stop 0\.5:\*\*\s*(-?\d+(?:\.\d+)?)").unwrap())
}

fn stop_1_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*Stop 1:\*\*\s*(-?\d+(?:\.\d+)?)").unwrap())
}

fn expected_profit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*Expected Profit:\*\*\s*([^\n\r]+)").unwrap())
}

fn progress_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*Progress:\*\*\s*([^\n\r]+)").unwrap())
}

fn parse_targets(raw: &str) -> Vec<Decimal> {
    raw.split(',')
        .filter_map(|t| Decimal::from_str(t.trim()).ok())
        .collect()
}

pub fn extract(text: &str, message_date: DateTime<Utc>) -> Option<EntrySignalData> {
    let ticker = ticker(text)?;
    let exchange = exchange(text)?;
    let side = color_side(text)?;
    let entry_price = Decimal::from_str(&entry_re().captures(text)?[1]).ok()?;
    let targets = parse_targets(&targets_re().captures(text)?[1]);
    let signal_time = signal_time(text, message_date);
    let expires_at = signal_time.map(|t| t + Duration::hours(2));

    Some(EntrySignalData {
        ticker,
        exchange,
        timeframe: timeframe(text),
        entry_price,
        targets,
        stop_0_5: stop_0_5_re()
            .captures(text)
            .and_then(|c| Decimal::from_str(&c[1]).ok()),
        stop_1: stop_1_re()
            .captures(text)
            .and_then(|c| Decimal::from_str(&c[1]).ok()),
        expected_profit_text: expected_profit_re().captures(text).map(|c| c[1].trim().to_owned()),
        progress_to_target_text: progress_re().captures(text).map(|c| c[1].trim().to_owned()),
        side,
        signal_time,
        expires_at,
        priority: 2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::types::Side;
    use chrono::TimeZone;

    fn sample_text() -> &'static str {
        "#BTCUSDT BINANCE \u{1F7E2} **LONG**\n**Entry:** 50000\n**Targets:** 51000, 52000, 53000\n**Stop 0.5:** 49500\n**Stop 1:** 49000\nT10:30:00 UTC"
    }

    #[test]
    fn extracts_entry_and_targets() {
        let message_date = Utc.with_ymd_and_hms(2026, 2, 28, 9, 0, 0).unwrap();
        let signal = extract(sample_text(), message_date).unwrap();
        assert_eq!(signal.entry_price, Decimal::from(50000));
        assert_eq!(signal.targets.len(), 3);
        assert_eq!(signal.side, Side::Long);
        assert_eq!(signal.priority, 2);
    }

    #[test]
    fn expires_two_hours_after_signal_time() {
        let message_date = Utc.with_ymd_and_hms(2026, 2, 28, 9, 0, 0).unwrap();
        let signal = extract(sample_text(), message_date).unwrap();
        let expected = signal.signal_time.unwrap() + Duration::hours(2);
        assert_eq!(signal.expires_at, Some(expected));
    }

    #[test]
    fn missing_entry_price_rejects() {
        let text = "#BTCUSDT BINANCE **LONG** **Targets:** 51000";
        assert!(extract(text, Utc::now()).is_none());
    }
}
