//! Sentiment signal extraction (spec.md §4.2 "sentiment": day change %,
//! 24-hour change %, and a repeating per-timeframe zone line).

use super::extract_common::{exchange, ticker, timeframe};
use super::types::{SentimentSignal, Side, TimeframeZone};
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;

fn day_change_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)day[^%\n]*?([+-]?\d+(?:\.\d+)?)%").unwrap())
}

fn change_24h_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)24h[^%\n]*?([+-]?\d+(?:\.\d+)?)%").unwrap())
}

/// One zone line: a trend triangle, an optional OS/OB marker, a zone
/// percentage, an RSI reading, and a timeframe token.
fn zone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^\s*(\u{25B2}|\u{25BC})\s*(OB|OS)?\s*(\d+(?:\.\d+)?)%\s*RSI:\s*(-?\d+(?:\.\d+)?)\s*(\S+)\s*$",
        )
        .unwrap()
    })
}

fn extract_zones(text: &str) -> Vec<TimeframeZone> {
    zone_re()
        .captures_iter(text)
        .filter_map(|caps| {
            let trend = if &caps[1] == "\u{25B2}" { "up" } else { "down" }.to_owned();
            let os_ob = match &caps[2] {
                "OB" => Some(super::types::RsiSignal::Overbought),
                "OS" => Some(super::types::RsiSignal::Oversold),
                _ => None,
            };
            let zone_pct = Decimal::from_str(&caps[3]).ok();
            let rsi_value = Decimal::from_str(&caps[4]).ok();
            let tf = timeframe(&caps[5]).or_else(|| timeframe(&format!("**Timeframe:** {}", &caps[5])));
            Some(TimeframeZone {
                timeframe: tf?,
                trend,
                os_ob,
                zone_pct,
                rsi: rsi_value,
            })
        })
        .collect()
}

pub fn extract(text: &str) -> Option<SentimentSignal> {
    let ticker = ticker(text)?;
    let exchange = exchange(text)?;
    Some(SentimentSignal {
        ticker,
        exchange,
        day_change_pct: day_change_re()
            .captures(text)
            .and_then(|c| Decimal::from_str(&c[1]).ok()),
        change_24h_pct: change_24h_re()
            .captures(text)
            .and_then(|c| Decimal::from_str(&c[1]).ok()),
        zones: extract_zones(text),
        side: Side::Neutral,
        priority: 4,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::types::RsiSignal;

    #[test]
    fn extracts_ticker_exchange_and_changes() {
        let text = "#SENTIMENT #BTCUSDT BINANCE\nDay change: +3.2%\n24h change: -1.5%";
        let signal = extract(text).unwrap();
        assert_eq!(signal.ticker, "BTCUSDT");
        assert_eq!(signal.day_change_pct, Some(Decimal::from_str("3.2").unwrap()));
        assert_eq!(signal.change_24h_pct, Some(Decimal::from_str("-1.5").unwrap()));
        assert_eq!(signal.side, Side::Neutral);
    }

    #[test]
    fn extracts_timeframe_zones() {
        let text = "#SENTIMENT #BTCUSDT BINANCE\n\u{25B2} OB 40% RSI:72 1h\n\u{25BC} OS 20% RSI:28 4h";
        let signal = extract(text).unwrap();
        assert_eq!(signal.zones.len(), 2);
        assert_eq!(signal.zones[0].trend, "up");
        assert_eq!(signal.zones[0].os_ob, Some(RsiSignal::Overbought));
        assert_eq!(signal.zones[1].trend, "down");
    }

    #[test]
    fn missing_ticker_rejects() {
        assert!(extract("#SENTIMENT BINANCE no ticker here").is_none());
    }
}
