use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// On-chain signal state for one asset. One logical row per asset,
/// updated in place.
///
/// `whale_net_flow` is signed as (inflow - outflow): positive means
/// exchange-bound coins (distribution, bearish), negative means coins
/// leaving exchanges (accumulation, bullish).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OnchainScore {
    pub asset_id: String,
    pub whale_signal: Option<String>,
    pub whale_net_flow: Option<Decimal>,
    pub whale_inflow: Option<Decimal>,
    pub whale_outflow: Option<Decimal>,
    pub dau_trend: Option<String>,
    pub holder_accumulation: Option<Decimal>,
    pub overall_signal: Option<String>,
    pub bullish_probability: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

impl OnchainScore {
    /// Inflow and outflow are reported as non-negative magnitudes; a
    /// negative magnitude means the upstream feed is corrupt and the row
    /// must be treated as insufficient for the cycle.
    pub fn is_consistent(&self) -> bool {
        let inflow_ok = self.whale_inflow.map_or(true, |v| v >= Decimal::ZERO);
        let outflow_ok = self.whale_outflow.map_or(true, |v| v >= Decimal::ZERO);
        inflow_ok && outflow_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(inflow: Option<i64>, outflow: Option<i64>) -> OnchainScore {
        OnchainScore {
            asset_id: "bitcoin".into(),
            whale_signal: None,
            whale_net_flow: None,
            whale_inflow: inflow.map(Decimal::from),
            whale_outflow: outflow.map(Decimal::from),
            dau_trend: None,
            holder_accumulation: None,
            overall_signal: None,
            bullish_probability: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_negative_flow_magnitude_is_inconsistent() {
        assert!(row(Some(1_000), Some(500)).is_consistent());
        assert!(row(None, None).is_consistent());
        assert!(row(Some(0), Some(0)).is_consistent());

        assert!(!row(Some(-1_000), Some(500)).is_consistent());
        assert!(!row(Some(1_000), Some(-500)).is_consistent());
    }
}
