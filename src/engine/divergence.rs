use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{DivergenceType, WhaleBehavior};

/// Thresholds for sentiment/whale-flow classification and intent
/// scoring. Flow magnitudes are USD.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivergenceConfig {
    /// Sentiment below this reads as Fear/FUD.
    pub fear_threshold: Decimal,
    /// Sentiment above this reads as FOMO/Euphoria.
    pub greed_threshold: Decimal,
    /// |net_flow| at or above this counts as a strong flow.
    pub strong_flow_usd: Decimal,
    /// |net_flow| at or above this saturates the flow term of the
    /// intent score.
    pub flow_scale_usd: Decimal,
    /// Sentiment distance from 50 beyond which it carries a direction.
    pub sentiment_deadband: Decimal,
    /// |net_flow| at or above this carries a direction for the
    /// confirmation check.
    pub confirm_flow_usd: Decimal,
    /// Whale-count at which corroboration saturates.
    pub max_corroborating_whales: i32,
}

impl Default for DivergenceConfig {
    fn default() -> Self {
        Self {
            fear_threshold: Decimal::from(40),
            greed_threshold: Decimal::from(70),
            strong_flow_usd: Decimal::from(250_000),
            flow_scale_usd: Decimal::from(500_000),
            sentiment_deadband: Decimal::from(10),
            confirm_flow_usd: Decimal::from(100_000),
            max_corroborating_whales: 10,
        }
    }
}

/// Snapshot of the inputs one divergence evaluation reads, all taken as
/// of the same pass timestamp.
#[derive(Debug, Clone)]
pub struct DivergenceRead {
    pub sentiment_score: Decimal,
    pub whale_net_flow: Decimal,
    pub dominant_behavior: WhaleBehavior,
    pub dominant_confidence: Decimal,
    pub active_whale_count: i32,
}

/// Classify the sentiment/whale-flow relationship.
///
/// Total over its domain and evaluated in priority order — the first
/// matching arm wins, so a reading that is textually both a shadow
/// accumulation and a confirmation classifies as shadow accumulation.
///
/// Net flow is signed (inflow - outflow): negative = coins leaving
/// exchanges = accumulation = bullish.
pub fn classify(
    sentiment: Decimal,
    net_flow: Decimal,
    dominant_behavior: WhaleBehavior,
    cfg: &DivergenceConfig,
) -> DivergenceType {
    // 1. Crowd fearful, whales accumulating hard, and the addresses doing
    //    it have an accumulation track record.
    if sentiment < cfg.fear_threshold
        && net_flow <= -cfg.strong_flow_usd
        && dominant_behavior.is_smart_accumulation()
    {
        return DivergenceType::ShadowAccumulation;
    }

    // 2. Crowd euphoric, whales moving size onto exchanges.
    if sentiment > cfg.greed_threshold && net_flow >= cfg.strong_flow_usd {
        return DivergenceType::BullTrap;
    }

    // 3. Both pointing the same way, each clearing its own deadband.
    let sentiment_bullish = sentiment >= Decimal::from(50) + cfg.sentiment_deadband;
    let sentiment_bearish = sentiment <= Decimal::from(50) - cfg.sentiment_deadband;
    let flow_bullish = net_flow <= -cfg.confirm_flow_usd;
    let flow_bearish = net_flow >= cfg.confirm_flow_usd;

    if (sentiment_bullish && flow_bullish) || (sentiment_bearish && flow_bearish) {
        return DivergenceType::Confirmation;
    }

    DivergenceType::Neutral
}

/// Magnitude of the divergence in [0, 100].
///
/// Base term: how extreme the sentiment is plus how large the flow is,
/// each saturating at its scale. The base is then adjusted by the
/// dominant profile's confidence and by how many whale addresses
/// corroborate the flow — more independent addresses and a
/// better-established profile push the score up, a thin profile pulls
/// it down.
pub fn intent_score(
    read: &DivergenceRead,
    cfg: &DivergenceConfig,
) -> Decimal {
    let fifty = Decimal::from(50);
    let hundred = Decimal::from(100);

    let extremity = ((read.sentiment_score - fifty).abs() / fifty).min(Decimal::ONE);
    let flow_mag = (read.whale_net_flow.abs() / cfg.flow_scale_usd).min(Decimal::ONE);

    let half = Decimal::new(50, 2);
    let base = hundred * (half * extremity + half * flow_mag);

    // Profile confidence moves the score by up to +/-15%.
    let conf = read.dominant_confidence.clamp(Decimal::ZERO, Decimal::ONE);
    let conf_factor = Decimal::new(85, 2) + Decimal::new(30, 2) * conf;

    // Corroborating addresses move it by up to +/-10%.
    let capped = read
        .active_whale_count
        .clamp(0, cfg.max_corroborating_whales);
    let count_ratio = Decimal::from(capped) / Decimal::from(cfg.max_corroborating_whales);
    let count_factor = Decimal::new(90, 2) + Decimal::new(20, 2) * count_ratio;

    (base * conf_factor * count_factor)
        .max(Decimal::ZERO)
        .min(hundred)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
