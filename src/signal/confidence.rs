//! Confidence scoring (spec.md §4.2): per-variant base score, weighted
//! factors, clamp to [0, 100]. The factor list is part of the contract.

use super::types::{
    Confidence, DirectionalSignal, EntrySignalData, FundingRateData, QuickTargetData, RsiSignal,
    SentimentSignal,
};
use rust_decimal::Decimal;

pub fn strong_medium(signal: &DirectionalSignal) -> Confidence {
    let mut confidence = Confidence::new(50);
    if matches!(
        signal.rsi_signal,
        Some(RsiSignal::Overbought) | Some(RsiSignal::Oversold)
    ) {
        confidence.add(15, "rsi_extreme");
    }
    if matches!(signal.pattern, super::types::Pattern::TrendReversal) {
        confidence.add(10, "pattern_trend_reversal");
    }
    if signal.pattern_strength >= Decimal::from(60) {
        confidence.add(10, "high_pattern_strength");
    }
    if signal.timeframe.is_some() {
        confidence.add(5, "timeframe_present");
    }
    if signal.signal_time.is_some() {
        confidence.add(5, "signal_time_present");
    }
    confidence.finish()
}

pub fn sentiment(signal: &SentimentSignal) -> Confidence {
    let mut confidence = Confidence::new(50);
    if signal.zones.len() >= 2 {
        confidence.add(10, "multiple_timeframe_zones");
    }
    if signal.day_change_pct.is_some() {
        confidence.add(5, "day_change_present");
    }
    if signal.change_24h_pct.is_some() {
        confidence.add(5, "24h_change_present");
    }
    confidence.finish()
}

pub fn entry_signal(signal: &EntrySignalData) -> Confidence {
    let mut confidence = Confidence::new(50);
    if signal.targets.len() >= 3 {
        confidence.add(10, "multiple_targets");
    }
    if signal.stop_0_5.is_some() && signal.stop_1.is_some() {
        confidence.add(10, "both_stop_tiers_present");
    }
    if signal.signal_time.is_some() {
        confidence.add(5, "signal_time_present");
    }
    confidence.finish()
}

pub fn quick_target(signal: &QuickTargetData) -> Confidence {
    let mut confidence = Confidence::new(50);
    if signal.targets.len() >= 2 {
        confidence.add(10, "multiple_targets");
    }
    if signal.signal_time.is_some() {
        confidence.add(5, "signal_time_present");
    }
    confidence.finish()
}

pub fn funding_rate(signal: &FundingRateData) -> Confidence {
    let mut confidence = Confidence::new(70);
    if signal.funding_rate_pct.abs() >= Decimal::new(5, 1) {
        confidence.add(10, "high_magnitude_rate");
    }
    confidence.add(5, "receiver_recommendation_consistent");
    confidence.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::types::{Exchange, Pattern, Receiver, Side};

    #[test]
    fn strong_signal_spec_example_scores_at_least_80() {
        let signal = DirectionalSignal {
            ticker: "BTCUSDT".into(),
            exchange: Exchange::Binance,
            timeframe: None,
            pattern: Pattern::TrendReversal,
            pattern_strength: Decimal::from(65),
            side: Side::Short,
            rsi: Some(Decimal::from(72)),
            rsi_signal: Some(RsiSignal::Overbought),
            signal_time: Some(chrono::Utc::now()),
            priority: 1,
        };
        assert!(strong_medium(&signal).score >= 80);
    }

    #[test]
    fn funding_rate_spec_example_scores_at_least_85() {
        let signal = FundingRateData {
            exchange: Exchange::Bybit,
            instrument: "BTCUSDT".into(),
            funding_time: chrono::Utc::now(),
            funding_rate_pct: Decimal::new(-6, 1),
            receiver: Receiver::Longs,
            recommended_action: Side::Long,
            next_funding_in_secs: 0,
            priority: 3,
        };
        assert!(funding_rate(&signal).score >= 85);
    }

    #[test]
    fn all_directional_factors_accumulate() {
        let signal = DirectionalSignal {
            ticker: "BTCUSDT".into(),
            exchange: Exchange::Binance,
            timeframe: Some(super::super::types::Timeframe::OneHour),
            pattern: Pattern::TrendReversal,
            pattern_strength: Decimal::from(99),
            side: Side::Long,
            rsi: Some(Decimal::from(80)),
            rsi_signal: Some(RsiSignal::Overbought),
            signal_time: Some(chrono::Utc::now()),
            priority: 1,
        };
        assert_eq!(strong_medium(&signal).score, 95);
    }

    #[test]
    fn confidence_clamps_above_one_hundred() {
        let mut confidence = Confidence::new(90);
        confidence.add(30, "over_budget");
        assert_eq!(confidence.finish().score, 100);
    }
}
