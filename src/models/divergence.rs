use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Relationship between crowd sentiment and whale flow at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceType {
    /// Crowd panicking, smart money accumulating off-exchange. Bullish.
    ShadowAccumulation,
    /// Crowd euphoric, smart money moving coins to exchanges. Bearish.
    BullTrap,
    /// Sentiment and whale flow agree within tolerance.
    Confirmation,
    Neutral,
}

impl DivergenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DivergenceType::ShadowAccumulation => "shadow_accumulation",
            DivergenceType::BullTrap => "bull_trap",
            DivergenceType::Confirmation => "confirmation",
            DivergenceType::Neutral => "neutral",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "shadow_accumulation" => Some(DivergenceType::ShadowAccumulation),
            "bull_trap" => Some(DivergenceType::BullTrap),
            "confirmation" => Some(DivergenceType::Confirmation),
            "neutral" => Some(DivergenceType::Neutral),
            _ => None,
        }
    }

    /// Divergences that can be promoted into a golden-shadow signal.
    pub fn is_actionable(&self) -> bool {
        matches!(
            self,
            DivergenceType::ShadowAccumulation | DivergenceType::BullTrap
        )
    }
}

impl fmt::Display for DivergenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only audit row: one per evaluation cycle per asset.
/// `insight` is free text from the external narrative service, stored
/// opaquely and never used for any numeric decision.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IntentDivergenceLog {
    pub id: Uuid,
    pub asset_id: String,
    pub evaluated_at: DateTime<Utc>,
    pub sentiment_score: Option<Decimal>,
    pub crowd_action: Option<String>,
    pub whale_score: Option<Decimal>,
    pub whale_net_flow: Option<Decimal>,
    pub divergence_type: String,
    pub intent_score: Decimal,
    pub dominant_whale_behavior: Option<String>,
    pub active_whale_count: i32,
    pub insight: Option<String>,
}

impl IntentDivergenceLog {
    pub fn divergence_enum(&self) -> Option<DivergenceType> {
        DivergenceType::from_api_str(&self.divergence_type)
    }
}
