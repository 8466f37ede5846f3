//! Funding rate extraction (spec.md §4.2 "funding_rate").

use super::types::{Exchange, FundingRateData, Receiver, Side};
use chrono::{NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;

const LONGS_RECEIVE_MARKER: &str = "\u{41b}\u{43e}\u{43d}\u{433}\u{438} \u{43f}\u{43e}\u{43b}\u{443}\u{447}\u{430}\u{44e}\u{442}";

fn exchange_paren_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\((binance|bybit|mexc|bats)\)").unwrap())
}

fn instrument_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([A-Za-z0-9]+)\]\(").unwrap())
}

fn funding_time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\*\*\u{412}\u{440}\u{435}\u{43c}\u{44f}:\*\*\s*(\d{2}\.\d{2}\.\d{4})\s+(\d{2}:\d{2})")
            .unwrap()
    })
}

fn funding_rate_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\*\*\u{421}\u{442}\u{430}\u{432}\u{43a}\u{430}:\*\*\s*(\u{2212}|-)?(\d+(?:\.\d+)?)%")
            .unwrap()
    })
}

pub fn extract(text: &str) -> Option<FundingRateData> {
    let exchange = match exchange_paren_re().captures(text)?[1].to_uppercase().as_str() {
        "BINANCE" => Exchange::Binance,
        "BYBIT" => Exchange::Bybit,
        "MEXC" => Exchange::Mexc,
        "BATS" => Exchange::Bats,
        _ => return None,
    };
    let instrument = instrument_re().captures(text)?[1].to_owned();

    let time_caps = funding_time_re().captures(text)?;
    let naive = NaiveDateTime::parse_from_str(
        &format!("{} {}", &time_caps[1], &time_caps[2]),
        "%d.%m.%Y %H:%M",
    )
    .ok()?;
    let funding_time = Utc.from_utc_datetime(&naive);

    let rate_caps = funding_rate_re().captures(text)?;
    let magnitude = Decimal::from_str(&rate_caps[2]).ok()?;
    let funding_rate_pct = if rate_caps.get(1).is_some() {
        -magnitude
    } else {
        magnitude
    };

    let receiver = if funding_rate_pct < Decimal::ZERO {
        Receiver::Longs
    } else {
        Receiver::Shorts
    };
    let recommended_action = if text.contains(LONGS_RECEIVE_MARKER) || funding_rate_pct < Decimal::ZERO {
        Side::Long
    } else {
        Side::Short
    };

    let next_funding_in_secs = (funding_time - Utc::now()).num_seconds().max(0);

    Some(FundingRateData {
        exchange,
        instrument,
        funding_time,
        funding_rate_pct,
        receiver,
        recommended_action,
        next_funding_in_secs,
        priority: 3,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_example_text() -> String {
        format!(
            "\u{26a1}\u{fe0f} \u{421}\u{438}\u{433}\u{43d}\u{430}\u{43b} \u{43f}\u{43e} \u{444}\u{430}\u{43d}\u{434}\u{438}\u{43d}\u{433}\u{443} (BYBIT)\n**\u{418}\u{43d}\u{441}\u{442}\u{440}\u{443}\u{43c}\u{435}\u{43d}\u{442}:** [BTCUSDT](https://example.com)\n**\u{412}\u{440}\u{435}\u{43c}\u{44f}:** 28.02.2026 10:00\n**\u{421}\u{442}\u{430}\u{432}\u{43a}\u{430}:** \u{2212}0.6000%\n{LONGS_RECEIVE_MARKER}"
        )
    }

    #[test]
    fn extracts_spec_example_with_negative_rate() {
        let signal = extract(&spec_example_text()).unwrap();
        assert_eq!(signal.exchange, Exchange::Bybit);
        assert_eq!(signal.instrument, "BTCUSDT");
        assert_eq!(signal.funding_rate_pct, Decimal::from_str("-0.6").unwrap());
        assert_eq!(signal.receiver, Receiver::Longs);
        assert_eq!(signal.recommended_action, Side::Long);
        assert_eq!(signal.priority, 3);
    }

    #[test]
    fn positive_rate_routes_to_shorts() {
        let text = "\u{26a1}\u{fe0f} \u{421}\u{438}\u{433}\u{43d}\u{430}\u{43b} \u{43f}\u{43e} \u{444}\u{430}\u{43d}\u{434}\u{438}\u{43d}\u{433}\u{443} (BINANCE)\n**\u{418}\u{43d}\u{441}\u{442}\u{440}\u{443}\u{43c}\u{435}\u{43d}\u{442}:** [ETHUSDT](x)\n**\u{412}\u{440}\u{435}\u{43c}\u{44f}:** 01.03.2026 00:00\n**\u{421}\u{442}\u{430}\u{432}\u{43a}\u{430}:** 0.0001%";
        let signal = extract(text).unwrap();
        assert_eq!(signal.receiver, Receiver::Shorts);
        assert_eq!(signal.recommended_action, Side::Short);
    }

    #[test]
    fn zero_rate_routes_to_shorts() {
        let text = "\u{26a1}\u{fe0f} \u{421}\u{438}\u{433}\u{43d}\u{430}\u{43b} \u{43f}\u{43e} \u{444}\u{430}\u{43d}\u{434}\u{438}\u{43d}\u{433}\u{443} (BINANCE)\n**\u{418}\u{43d}\u{441}\u{442}\u{440}\u{443}\u{43c}\u{435}\u{43d}\u{442}:** [ETHUSDT](x)\n**\u{412}\u{440}\u{435}\u{43c}\u{44f}:** 01.03.2026 00:00\n**\u{421}\u{442}\u{430}\u{432}\u{43a}\u{430}:** 0%";
        let signal = extract(text).unwrap();
        assert_eq!(signal.receiver, Receiver::Shorts);
    }
}
