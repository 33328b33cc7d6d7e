use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Direction of an on-chain whale movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxDirection {
    Buy,
    Sell,
    Transfer,
}

impl TxDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxDirection::Buy => "buy",
            TxDirection::Sell => "sell",
            TxDirection::Transfer => "transfer",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "buy" => Some(TxDirection::Buy),
            "sell" => Some(TxDirection::Sell),
            "transfer" => Some(TxDirection::Transfer),
            _ => None,
        }
    }
}

impl fmt::Display for TxDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Behavioral archetype assigned to a whale address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhaleBehavior {
    ValueHunter,
    NewsFrontRunner,
    PanicSeller,
    Accumulator,
    Mixed,
}

impl WhaleBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            WhaleBehavior::ValueHunter => "value_hunter",
            WhaleBehavior::NewsFrontRunner => "news_front_runner",
            WhaleBehavior::PanicSeller => "panic_seller",
            WhaleBehavior::Accumulator => "accumulator",
            WhaleBehavior::Mixed => "mixed",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "value_hunter" => Some(WhaleBehavior::ValueHunter),
            "news_front_runner" => Some(WhaleBehavior::NewsFrontRunner),
            "panic_seller" => Some(WhaleBehavior::PanicSeller),
            "accumulator" => Some(WhaleBehavior::Accumulator),
            "mixed" => Some(WhaleBehavior::Mixed),
            _ => None,
        }
    }

    /// Behaviors that corroborate a shadow-accumulation read.
    pub fn is_smart_accumulation(&self) -> bool {
        matches!(self, WhaleBehavior::Accumulator | WhaleBehavior::ValueHunter)
    }
}

impl fmt::Display for WhaleBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified whale transaction with the market context captured at
/// execution time. Outcome columns are filled by a later reconciliation
/// pass (two-phase write: unresolved -> resolved) and never edited after
/// resolution.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WhaleTransaction {
    pub id: Uuid,
    pub address: String,
    pub chain: Option<String>,
    pub asset_id: String,
    pub direction: String,
    pub usd_value: Decimal,
    // Market context at transaction time
    pub price_at_tx: Option<Decimal>,
    pub change_24h_at_tx: Option<Decimal>,
    pub rsi_at_tx: Option<Decimal>,
    pub sentiment_at_tx: Option<Decimal>,
    // Outcome, filled once the window has elapsed
    pub price_after_24h: Option<Decimal>,
    pub price_after_7d: Option<Decimal>,
    pub profit_pct: Option<Decimal>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub executed_at: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
}

impl WhaleTransaction {
    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }

    pub fn direction_enum(&self) -> Option<TxDirection> {
        TxDirection::from_api_str(&self.direction)
    }
}

/// Rolling behavioral profile for one whale address, recomputed from its
/// resolved transaction history. Never deleted, only updated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WhaleBehavioralProfile {
    pub address: String,
    pub chain: Option<String>,
    pub behavior_label: String,
    pub behavior_confidence: Decimal,
    pub success_rate: Option<Decimal>,
    pub avg_reaction_latency_mins: Option<Decimal>,
    pub trades_before_news: i32,
    pub trades_during_fear: i32,
    pub trades_during_greed: i32,
    pub total_transactions: i32,
    pub resolved_transactions: i32,
    pub updated_at: DateTime<Utc>,
}

impl WhaleBehavioralProfile {
    pub fn behavior_enum(&self) -> Option<WhaleBehavior> {
        WhaleBehavior::from_api_str(&self.behavior_label)
    }
}
