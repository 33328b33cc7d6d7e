pub mod asset;
pub mod divergence;
pub mod golden;
pub mod onchain;
pub mod sentiment;
pub mod technical;
pub mod whale;

pub use asset::AssetSnapshot;
pub use divergence::{DivergenceType, IntentDivergenceLog};
pub use golden::{GoldenShadowSignal, GoldenSignalType, SignalOutcome};
pub use onchain::OnchainScore;
pub use sentiment::{CrowdAction, EmotionalTone, SentimentScore};
pub use technical::{
    IndicatorSnapshot, PatternDirection, PatternReliability, RsiDivergence, TechnicalScore,
    TrendLabel,
};
pub use whale::{TxDirection, WhaleBehavior, WhaleBehavioralProfile, WhaleTransaction};

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Timeframe
// ---------------------------------------------------------------------------

/// Candle timeframes a technical score is computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    H1,
    H4,
    D1,
    W1,
    Mo1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 5] = [
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
        Timeframe::W1,
        Timeframe::Mo1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
            Timeframe::Mo1 => "1M",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s {
            "1h" => Some(Timeframe::H1),
            "4h" => Some(Timeframe::H4),
            "1d" => Some(Timeframe::D1),
            "1w" => Some(Timeframe::W1),
            "1M" => Some(Timeframe::Mo1),
            _ => None,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Horizon
// ---------------------------------------------------------------------------

/// Trading horizon bucket each timeframe score rolls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Horizon {
    Short,
    Medium,
    Long,
}

impl Horizon {
    /// Timeframes that compose this horizon.
    pub fn timeframes(&self) -> &'static [Timeframe] {
        match self {
            Horizon::Short => &[Timeframe::H1],
            Horizon::Medium => &[Timeframe::H4, Timeframe::D1],
            Horizon::Long => &[Timeframe::W1, Timeframe::Mo1],
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Horizon::Short => write!(f, "short"),
            Horizon::Medium => write!(f, "medium"),
            Horizon::Long => write!(f, "long"),
        }
    }
}

// ---------------------------------------------------------------------------
// SignalLabel
// ---------------------------------------------------------------------------

/// Five-way directional label derived from a 0-100 score via the
/// configured breakpoint table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalLabel {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl SignalLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalLabel::StrongBuy => "STRONG_BUY",
            SignalLabel::Buy => "BUY",
            SignalLabel::Hold => "HOLD",
            SignalLabel::Sell => "SELL",
            SignalLabel::StrongSell => "STRONG_SELL",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "STRONG_BUY" => Some(SignalLabel::StrongBuy),
            "BUY" => Some(SignalLabel::Buy),
            "HOLD" => Some(SignalLabel::Hold),
            "SELL" => Some(SignalLabel::Sell),
            "STRONG_SELL" => Some(SignalLabel::StrongSell),
            _ => None,
        }
    }
}

impl fmt::Display for SignalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DataStatus
// ---------------------------------------------------------------------------

/// Whether a score was actually computed or its inputs were missing/stale.
/// Callers must be able to tell "computed" apart from "not available" —
/// a missing component is never silently coerced to neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataStatus {
    Ok,
    Insufficient,
}

impl fmt::Display for DataStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataStatus::Ok => write!(f, "OK"),
            DataStatus::Insufficient => write!(f, "INSUFFICIENT"),
        }
    }
}
