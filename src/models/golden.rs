use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// What a promoted signal tells the consumer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoldenSignalType {
    Entry,
    Exit,
}

impl GoldenSignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoldenSignalType::Entry => "entry",
            GoldenSignalType::Exit => "exit",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "entry" => Some(GoldenSignalType::Entry),
            "exit" => Some(GoldenSignalType::Exit),
            _ => None,
        }
    }
}

impl fmt::Display for GoldenSignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a golden-shadow signal. Success/failure are
/// terminal, assigned once outcome prices are observed after the
/// evaluation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalOutcome {
    Pending,
    Success,
    Failure,
}

impl SignalOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalOutcome::Pending => "pending",
            SignalOutcome::Success => "success",
            SignalOutcome::Failure => "failure",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(SignalOutcome::Pending),
            "success" => Some(SignalOutcome::Success),
            "failure" => Some(SignalOutcome::Failure),
            _ => None,
        }
    }
}

impl fmt::Display for SignalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A promoted, time-bounded trade signal. Only outcome fields mutate
/// after insertion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GoldenShadowSignal {
    pub id: Uuid,
    pub asset_id: String,
    pub signal_timestamp: DateTime<Utc>,
    pub signal_type: String,
    pub intent_score: Decimal,
    pub divergence_type: String,
    pub entry_price: Decimal,
    pub stop_price: Decimal,
    pub target_price: Decimal,
    pub outcome: String,
    pub actual_price_24h: Option<Decimal>,
    pub actual_price_7d: Option<Decimal>,
    pub expires_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl GoldenShadowSignal {
    pub fn signal_type_enum(&self) -> Option<GoldenSignalType> {
        GoldenSignalType::from_api_str(&self.signal_type)
    }

    pub fn outcome_enum(&self) -> Option<SignalOutcome> {
        SignalOutcome::from_api_str(&self.outcome)
    }

    pub fn is_pending(&self) -> bool {
        self.outcome_enum() == Some(SignalOutcome::Pending)
    }
}
