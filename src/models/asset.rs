use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Market snapshot for one asset, refreshed each ingestion cycle.
/// Read-only input to scoring; this engine never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AssetSnapshot {
    pub asset_id: String,
    pub symbol: String,
    pub price: Decimal,
    pub change_1h: Option<Decimal>,
    pub change_24h: Option<Decimal>,
    pub change_7d: Option<Decimal>,
    pub volume_24h: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub fetched_at: DateTime<Utc>,
}
