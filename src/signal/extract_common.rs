//! Shared field extractors used by every variant parser (spec.md §4.2).

use super::types::{Exchange, RsiSignal, Side, Timeframe};
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;

/// Color/keyword direction marker shared by the directional and entry
/// variants: red emoji or an explicit `**SHORT**` label wins over green /
/// `**LONG**` when both are (improbably) present.
pub fn color_side(text: &str) -> Option<Side> {
    if text.contains('\u{1F534}') || text.contains("**SHORT**") {
        Some(Side::Short)
    } else if text.contains('\u{1F7E2}') || text.contains("**LONG**") {
        Some(Side::Long)
    } else {
        None
    }
}

const RESERVED_TAGS: &[&str] = &[
    "STRONGSIGNAL",
    "MEDIUMSIGNAL",
    "SENTIMENT",
    "BINANCE",
    "BYBIT",
    "MEXC",
    "BATS",
];

fn ticker_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#([A-Z]{3,10})\b").unwrap())
}

fn ticker_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*Ticker:\*\*\s*([A-Za-z0-9]{1,15})").unwrap())
}

/// `#XXX` (3-10 uppercase letters, excluding known tag/exchange markers) or
/// a `**Ticker:** XXX` labeled field.
pub fn ticker(text: &str) -> Option<String> {
    if let Some(caps) = ticker_label_re().captures(text) {
        return Some(caps[1].to_uppercase());
    }
    ticker_tag_re()
        .captures_iter(text)
        .map(|c| c[1].to_owned())
        .find(|candidate| !RESERVED_TAGS.contains(&candidate.as_str()))
}

fn exchange_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(binance|bybit|mexc|bats)\b").unwrap())
}

pub fn exchange(text: &str) -> Option<Exchange> {
    let caps = exchange_re().captures(text)?;
    match caps[1].to_uppercase().as_str() {
        "BINANCE" => Some(Exchange::Binance),
        "BYBIT" => Some(Exchange::Bybit),
        "MEXC" => Some(Exchange::Mexc),
        "BATS" => Some(Exchange::Bats),
        _ => None,
    }
}

const TIMEFRAME_TABLE: &[(&[&str], Timeframe)] = &[
    (&["1min", "1m", "1мин", "1 мин"], Timeframe::OneMin),
    (&["3min", "3m", "3мин", "3 мин"], Timeframe::ThreeMin),
    (&["5min", "5m", "5мин", "5 мин"], Timeframe::FiveMin),
    (&["15min", "15m", "15мин", "15 мин"], Timeframe::FifteenMin),
    (&["30min", "30m", "30мин", "30 мин"], Timeframe::ThirtyMin),
    (&["1h", "1ч", "1 час"], Timeframe::OneHour),
    (&["2h", "2ч", "2 часа"], Timeframe::TwoHour),
    (&["4h", "4ч", "4 часа"], Timeframe::FourHour),
    (&["12h", "12ч", "12 часов"], Timeframe::TwelveHour),
    (&["1d", "1д", "1 день"], Timeframe::OneDay),
];

fn timeframe_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\*\*(?:Timeframe|Таймфрейм):\*\*\s*([^\n\r]+)").unwrap())
}

pub fn timeframe(text: &str) -> Option<Timeframe> {
    let caps = timeframe_label_re().captures(text)?;
    let raw = caps[1].trim().to_lowercase();
    TIMEFRAME_TABLE
        .iter()
        .find(|(spellings, _)| spellings.contains(&raw.as_str()))
        .map(|(_, tf)| *tf)
}

fn rsi_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*RSI:\*\*\s*(-?\d+(?:\.\d+)?)").unwrap())
}

pub fn rsi(text: &str) -> Option<Decimal> {
    let caps = rsi_re().captures(text)?;
    Decimal::from_str(&caps[1]).ok()
}

pub fn rsi_signal(rsi_value: Decimal) -> RsiSignal {
    RsiSignal::classify(rsi_value)
}

fn signal_time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"T\s?(\d{2}):(\d{2}):(\d{2})\s*UTC").unwrap())
}

/// Overlays a `T hh:mm:ss UTC` pattern onto the message date's UTC day.
pub fn signal_time(text: &str, message_date: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let caps = signal_time_re().captures(text)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    let second: u32 = caps[3].parse().ok()?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)?;
    let date = message_date.date_naive();
    Utc.from_local_datetime(&date.and_time(time)).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_prefers_labeled_field_over_hashtag() {
        assert_eq!(
            ticker("#BTCUSDT **Ticker:** ETHUSDT"),
            Some("ETHUSDT".to_owned())
        );
    }

    #[test]
    fn ticker_skips_reserved_type_tags() {
        assert_eq!(
            ticker("#SENTIMENT #BTCUSDT some text"),
            Some("BTCUSDT".to_owned())
        );
    }

    #[test]
    fn ticker_returns_none_when_absent() {
        assert_eq!(ticker("no ticker here"), None);
    }

    #[test]
    fn exchange_matches_case_insensitively() {
        assert_eq!(exchange("traded on binance now"), Some(Exchange::Binance));
        assert_eq!(exchange("BYBIT futures"), Some(Exchange::Bybit));
        assert_eq!(exchange("no exchange here"), None);
    }

    #[test]
    fn timeframe_reads_labeled_field_english_and_russian() {
        assert_eq!(timeframe("**Timeframe:** 15m"), Some(Timeframe::FifteenMin));
        assert_eq!(
            timeframe("**Таймфрейм:** 1 час"),
            Some(Timeframe::OneHour)
        );
        assert_eq!(timeframe("no timeframe"), None);
    }

    #[test]
    fn rsi_classification_boundaries() {
        assert_eq!(
            RsiSignal::classify(Decimal::from_str("29.999").unwrap()),
            RsiSignal::Oversold
        );
        assert_eq!(
            RsiSignal::classify(Decimal::from(30)),
            RsiSignal::Neutral
        );
        assert_eq!(
            RsiSignal::classify(Decimal::from(70)),
            RsiSignal::Neutral
        );
        assert_eq!(
            RsiSignal::classify(Decimal::from_str("70.0001").unwrap()),
            RsiSignal::Overbought
        );
    }

    #[test]
    fn color_side_prefers_red_and_explicit_short_label() {
        assert_eq!(color_side("\u{1F534}\u{1F534} **SHORT**"), Some(Side::Short));
        assert_eq!(color_side("\u{1F7E2} **LONG**"), Some(Side::Long));
        assert_eq!(color_side("no marker here"), None);
    }

    #[test]
    fn signal_time_overlays_onto_message_date() {
        let message_date = Utc.with_ymd_and_hms(2026, 2, 28, 3, 0, 0).unwrap();
        let parsed = signal_time("BINANCE, T10:30:00 UTC", message_date).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-02-28T10:30:00+00:00");
    }
}
