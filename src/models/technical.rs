use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Trend direction read off moving-average structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendLabel {
    Up,
    Down,
    Sideways,
}

impl TrendLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendLabel::Up => "up",
            TrendLabel::Down => "down",
            TrendLabel::Sideways => "sideways",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "up" => Some(TrendLabel::Up),
            "down" => Some(TrendLabel::Down),
            "sideways" => Some(TrendLabel::Sideways),
            _ => None,
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reliability tier of a detected candlestick pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternReliability {
    Weak,
    Medium,
    High,
}

impl PatternReliability {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternReliability::Weak => "weak",
            PatternReliability::Medium => "medium",
            PatternReliability::High => "high",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "weak" | "low" => Some(PatternReliability::Weak),
            "medium" => Some(PatternReliability::Medium),
            "high" => Some(PatternReliability::High),
            _ => None,
        }
    }
}

/// Direction a candlestick pattern resolves toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternDirection {
    Bullish,
    Bearish,
}

impl PatternDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternDirection::Bullish => "bullish",
            PatternDirection::Bearish => "bearish",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bullish" => Some(PatternDirection::Bullish),
            "bearish" => Some(PatternDirection::Bearish),
            _ => None,
        }
    }
}

/// RSI/price divergence. Overrides the plain overbought/oversold vote
/// when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsiDivergence {
    Bullish,
    Bearish,
}

impl RsiDivergence {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsiDivergence::Bullish => "bullish",
            RsiDivergence::Bearish => "bearish",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bullish" => Some(RsiDivergence::Bullish),
            "bearish" => Some(RsiDivergence::Bearish),
            _ => None,
        }
    }
}

/// The indicator readings a technical score was computed from, persisted
/// alongside the score for explainability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: Option<Decimal>,
    pub macd_histogram: Option<Decimal>,
    pub trend: Option<TrendLabel>,
    pub pattern_name: Option<String>,
    pub pattern_direction: Option<PatternDirection>,
    pub pattern_reliability: Option<PatternReliability>,
    pub rsi_divergence: Option<RsiDivergence>,
}

/// One technical score row: (asset_id, timeframe) is the natural key and
/// each cycle overwrites the previous row. `score`/`signal` are null when
/// the timeframe had too few candles.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TechnicalScore {
    pub id: Uuid,
    pub asset_id: String,
    pub timeframe: String,
    pub score: Option<Decimal>,
    pub signal: Option<String>,
    pub rsi: Option<Decimal>,
    pub macd_histogram: Option<Decimal>,
    pub trend: Option<String>,
    pub pattern_name: Option<String>,
    pub pattern_direction: Option<String>,
    pub pattern_reliability: Option<String>,
    pub rsi_divergence: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl TechnicalScore {
    pub fn timeframe_enum(&self) -> Option<super::Timeframe> {
        super::Timeframe::from_api_str(&self.timeframe)
    }

    pub fn signal_enum(&self) -> Option<super::SignalLabel> {
        self.signal
            .as_deref()
            .and_then(super::SignalLabel::from_api_str)
    }
}
