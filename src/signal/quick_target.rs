//! Quick target extraction (spec.md §4.2 "quick_target"): leading
//! timestamp, exchange, Cyrillic growth/decline phrase, Cyrillic-labeled
//! entry and targets.

use super::extract_common::{exchange, signal_time, ticker};
use super::types::{QuickTargetData, Side};
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;

const GROWTH_MARKER: &str =
    "\u{41d}\u{41e}\u{412}\u{410}\u{42f} \u{426}\u{415}\u{41b}\u{042c} \u{420}\u{41e}\u{421}\u{422}\u{410}";
const DECLINE_MARKER: &str = "\u{41d}\u{41e}\u{412}\u{410}\u{42f} \u{426}\u{415}\u{41b}\u{042c} \u{41f}\u{410}\u{414}\u{415}\u{041d}\u{418}\u{042f}";

fn entry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\*\*\u{412}\u{445}\u{43e}\u{434}:\*\*\s*(-?\d+(?:\.\d+)?)").unwrap()
    })
}

fn targets_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\*\*\u{426}\u{435}\u{43b}\u{438}:\*\*\s*([^\n\r]+)").unwrap()
    })
}

fn direction(text: &str) -> Option<Side> {
    if text.contains(GROWTH_MARKER) {
        Some(Side::Long)
    } else if text.contains(DECLINE_MARKER) {
        Some(Side::Short)
    } else {
        None
    }
}

pub fn extract(text: &str, message_date: DateTime<Utc>) -> Option<QuickTargetData> {
    let ticker = ticker(text)?;
    let exchange = exchange(text)?;
    let side = direction(text)?;
    let entry_price = Decimal::from_str(&entry_re().captures(text)?[1]).ok()?;
    let targets = targets_re().captures(text)?[1]
        .split(',')
        .filter_map(|t| Decimal::from_str(t.trim()).ok())
        .collect();
    let signal_time = signal_time(text, message_date);
    let expires_at = signal_time.map(|t| t + Duration::minutes(30));

    Some(QuickTargetData {
        ticker,
        exchange,
        side,
        entry_price,
        targets,
        signal_time,
        expires_at,
        priority: 2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_text() -> String {
        format!(
            "T10:30:00 UTC (BINANCE) #BTCUSDT\n{GROWTH_MARKER}\n**\u{412}\u{445}\u{43e}\u{434}:** 50000\n**\u{426}\u{435}\u{43b}\u{438}:** 51000, 52000"
        )
    }

    #[test]
    fn extracts_growth_direction_and_targets() {
        let message_date = Utc.with_ymd_and_hms(2026, 2, 28, 9, 0, 0).unwrap();
        let signal = extract(&sample_text(), message_date).unwrap();
        assert_eq!(signal.side, Side::Long);
        assert_eq!(signal.entry_price, Decimal::from(50000));
        assert_eq!(signal.targets.len(), 2);
    }

    #[test]
    fn expires_thirty_minutes_after_signal_time() {
        let message_date = Utc.with_ymd_and_hms(2026, 2, 28, 9, 0, 0).unwrap();
        let signal = extract(&sample_text(), message_date).unwrap();
        let expected = signal.signal_time.unwrap() + Duration::minutes(30);
        assert_eq!(signal.expires_at, Some(expected));
    }

    #[test]
    fn missing_direction_phrase_rejects() {
        let text = "T10:30:00 UTC (BINANCE) #BTCUSDT **\u{412}\u{445}\u{43e}\u{434}:** 50000";
        assert!(extract(text, Utc::now()).is_none());
    }
}
