use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Emotional tone of the crowd, bucketed from the sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmotionalTone {
    Fear,
    Fud,
    Neutral,
    Fomo,
    Euphoria,
}

impl EmotionalTone {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionalTone::Fear => "fear",
            EmotionalTone::Fud => "fud",
            EmotionalTone::Neutral => "neutral",
            EmotionalTone::Fomo => "fomo",
            EmotionalTone::Euphoria => "euphoria",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fear" => Some(EmotionalTone::Fear),
            "fud" => Some(EmotionalTone::Fud),
            "neutral" => Some(EmotionalTone::Neutral),
            "fomo" => Some(EmotionalTone::Fomo),
            "euphoria" => Some(EmotionalTone::Euphoria),
            _ => None,
        }
    }
}

impl fmt::Display for EmotionalTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action the crowd is expected to take given the current tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrowdAction {
    SellOff,
    BuyDip,
    Hold,
    FomoBuy,
    PanicSell,
}

impl CrowdAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrowdAction::SellOff => "sell_off",
            CrowdAction::BuyDip => "buy_dip",
            CrowdAction::Hold => "hold",
            CrowdAction::FomoBuy => "fomo_buy",
            CrowdAction::PanicSell => "panic_sell",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sell_off" | "sell-off" => Some(CrowdAction::SellOff),
            "buy_dip" | "buy-dip" => Some(CrowdAction::BuyDip),
            "hold" => Some(CrowdAction::Hold),
            "fomo_buy" | "fomo-buy" => Some(CrowdAction::FomoBuy),
            "panic_sell" | "panic-sell" => Some(CrowdAction::PanicSell),
            _ => None,
        }
    }
}

impl fmt::Display for CrowdAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sentiment analysis run for an asset. Append-only; the latest row
/// per asset is authoritative, older rows are retained as history.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SentimentScore {
    pub id: Uuid,
    pub asset_id: String,
    pub score: Decimal,
    pub tone: String,
    pub crowd_action: String,
    pub intensity: i32,
    pub dominant_category: Option<String>,
    pub confidence: Decimal,
    pub analyzed_at: DateTime<Utc>,
}

impl SentimentScore {
    pub fn tone_enum(&self) -> Option<EmotionalTone> {
        EmotionalTone::from_api_str(&self.tone)
    }

    pub fn crowd_action_enum(&self) -> Option<CrowdAction> {
        CrowdAction::from_api_str(&self.crowd_action)
    }
}
