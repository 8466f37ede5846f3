//! The parsed signal document (spec.md §4.2 `TradingSignal`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    Binance,
    Bybit,
    Mexc,
    Bats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1min")]
    OneMin,
    #[serde(rename = "3min")]
    ThreeMin,
    #[serde(rename = "5min")]
    FiveMin,
    #[serde(rename = "15min")]
    FifteenMin,
    #[serde(rename = "30min")]
    ThirtyMin,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "2h")]
    TwoHour,
    #[serde(rename = "4h")]
    FourHour,
    #[serde(rename = "12h")]
    TwelveHour,
    #[serde(rename = "1d")]
    OneDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiSignal {
    Oversold,
    Overbought,
    Neutral,
}

impl RsiSignal {
    /// Boundary behavior: 29.999 => oversold, 30 => neutral, 70 => neutral,
    /// 70.0001 => overbought (spec.md §8).
    pub fn classify(rsi: Decimal) -> Self {
        if rsi < Decimal::from(30) {
            RsiSignal::Oversold
        } else if rsi > Decimal::from(70) {
            RsiSignal::Overbought
        } else {
            RsiSignal::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    TrendReversal,
    ObReversal,
    OsReversal,
    Breakout,
    Pullback,
    Divergence,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Receiver {
    Longs,
    Shorts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    En,
    Ru,
    Mixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub file_id: String,
    pub file_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceBlock {
    pub channel_name: String,
    pub channel_id: i64,
    pub upstream_message_id: i64,
    pub text: String,
    pub media: Vec<MediaDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataBlock {
    pub parser_version: String,
    pub processing_duration_ms: f64,
    pub language: Language,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Confidence {
    pub score: i32,
    pub factors: Vec<String>,
}

impl Confidence {
    pub fn new(base: i32) -> Self {
        Self {
            score: base,
            factors: Vec::new(),
        }
    }

    pub fn add(&mut self, delta: i32, factor: impl Into<String>) {
        self.score += delta;
        self.factors.push(factor.into());
    }

    pub fn finish(mut self) -> Self {
        self.score = self.score.clamp(0, 100);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeframeZone {
    pub timeframe: Timeframe,
    /// "up" or "down", from the trend-triangle marker.
    pub trend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_ob: Option<RsiSignal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_pct: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionalSignal {
    pub ticker: String,
    pub exchange: Exchange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,
    pub pattern: Pattern,
    pub pattern_strength: Decimal,
    pub side: Side,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi_signal: Option<RsiSignal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_time: Option<DateTime<Utc>>,
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentSignal {
    pub ticker: String,
    pub exchange: Exchange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_change_pct: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_24h_pct: Option<Decimal>,
    pub zones: Vec<TimeframeZone>,
    pub side: Side,
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrySignalData {
    pub ticker: String,
    pub exchange: Exchange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,
    pub entry_price: Decimal,
    pub targets: Vec<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_0_5: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_1: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_profit_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_to_target_text: Option<String>,
    pub side: Side,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickTargetData {
    pub ticker: String,
    pub exchange: Exchange,
    pub side: Side,
    pub entry_price: Decimal,
    pub targets: Vec<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingRateData {
    pub exchange: Exchange,
    pub instrument: String,
    pub funding_time: DateTime<Utc>,
    pub funding_rate_pct: Decimal,
    pub receiver: Receiver,
    pub recommended_action: Side,
    pub next_funding_in_secs: i64,
    pub priority: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    StrongSignal,
    MediumSignal,
    Sentiment,
    EntrySignal,
    QuickTarget,
    FundingRate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalDetails {
    StrongSignal(DirectionalSignal),
    MediumSignal(DirectionalSignal),
    Sentiment(SentimentSignal),
    EntrySignal(EntrySignalData),
    QuickTarget(QuickTargetData),
    FundingRate(FundingRateData),
}

impl SignalDetails {
    /// The side carried by whichever variant this is, for the processor's
    /// legacy-column projection (spec.md §4.3 step 5).
    pub fn side(&self) -> Side {
        match self {
            SignalDetails::StrongSignal(d) | SignalDetails::MediumSignal(d) => d.side,
            SignalDetails::Sentiment(d) => d.side,
            SignalDetails::EntrySignal(d) => d.side,
            SignalDetails::QuickTarget(d) => d.side,
            SignalDetails::FundingRate(d) => d.recommended_action,
        }
    }

    pub fn ticker(&self) -> Option<&str> {
        match self {
            SignalDetails::StrongSignal(d) | SignalDetails::MediumSignal(d) => Some(&d.ticker),
            SignalDetails::Sentiment(d) => Some(&d.ticker),
            SignalDetails::EntrySignal(d) => Some(&d.ticker),
            SignalDetails::QuickTarget(d) => Some(&d.ticker),
            SignalDetails::FundingRate(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingSignal {
    pub signal_id: Uuid,
    pub emitted_at: DateTime<Utc>,
    pub source: SourceBlock,
    pub metadata: MetadataBlock,
    pub confidence: Confidence,
    #[serde(flatten)]
    pub details: SignalDetails,
}
