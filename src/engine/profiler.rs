use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{WhaleBehavior, WhaleBehavioralProfile, WhaleTransaction};

/// Thresholds for behavior-label assignment and confidence scaling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilerConfig {
    /// sentiment_at_tx below this counts as a fear trade.
    pub fear_threshold: Decimal,
    /// sentiment_at_tx above this counts as a greed trade.
    pub greed_threshold: Decimal,
    /// Fraction of trades landing 1-2h before a news event that makes a
    /// front-runner.
    pub front_runner_ratio: Decimal,
    /// Median reaction latency (minutes) at or below which an address is
    /// considered news-reactive.
    pub low_latency_mins: Decimal,
    /// Median reaction latency (minutes) at or above which an address is
    /// clearly not trading off headlines.
    pub high_latency_mins: Decimal,
    /// success_rate at or above this is "high".
    pub high_success_rate: Decimal,
    /// success_rate below this is "low".
    pub low_success_rate: Decimal,
    /// Confidence saturation constant: confidence = n / (n + k).
    pub confidence_k: Decimal,
    /// Window before a news event in which a trade counts as
    /// front-running, in minutes (lower, upper).
    pub news_lead_mins: (i64, i64),
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            fear_threshold: Decimal::from(30),
            greed_threshold: Decimal::from(70),
            front_runner_ratio: Decimal::new(30, 2),
            low_latency_mins: Decimal::from(60),
            high_latency_mins: Decimal::from(240),
            high_success_rate: Decimal::new(60, 2),
            low_success_rate: Decimal::new(40, 2),
            confidence_k: Decimal::from(10),
            news_lead_mins: (60, 120),
        }
    }
}

/// Rebuild the behavioral profile for one address from its transaction
/// history.
///
/// The profile is a pure function of the history: replaying an
/// already-seen transaction (same id) cannot double-count, and
/// success_rate only moves when a transaction has a resolved outcome.
/// Updates for one address must be serialized by the caller; different
/// addresses are independent.
pub fn build_profile(
    address: &str,
    chain: Option<&str>,
    txs: &[WhaleTransaction],
    sentiment_spikes: &[DateTime<Utc>],
    news_events: &[DateTime<Utc>],
    cfg: &ProfilerConfig,
    now: DateTime<Utc>,
) -> WhaleBehavioralProfile {
    // Dedupe by id so a replayed row is a no-op.
    let mut seen: HashSet<Uuid> = HashSet::new();
    let txs: Vec<&WhaleTransaction> = txs.iter().filter(|t| seen.insert(t.id)).collect();

    let total = txs.len() as i32;
    let resolved: Vec<&&WhaleTransaction> = txs.iter().filter(|t| t.is_resolved()).collect();
    let resolved_count = resolved.len() as i32;

    // success_rate is only defined over resolved outcomes.
    let success_rate = if resolved.is_empty() {
        None
    } else {
        let profitable = resolved
            .iter()
            .filter(|t| t.profit_pct.map_or(false, |p| p > Decimal::ZERO))
            .count();
        Some(Decimal::from(profitable as i64) / Decimal::from(resolved.len() as i64))
    };

    let latency = median_reaction_latency(&txs, sentiment_spikes);

    let mut trades_during_fear = 0;
    let mut trades_during_greed = 0;
    for tx in &txs {
        if let Some(s) = tx.sentiment_at_tx {
            if s < cfg.fear_threshold {
                trades_during_fear += 1;
            } else if s > cfg.greed_threshold {
                trades_during_greed += 1;
            }
        }
    }

    let trades_before_news = txs
        .iter()
        .filter(|tx| is_before_news(tx.executed_at, news_events, cfg.news_lead_mins))
        .count() as i32;

    let label = assign_label(
        total,
        success_rate,
        latency,
        trades_before_news,
        trades_during_fear,
        cfg,
    );

    // Confidence saturates with sample size: n/(n+k).
    let n = Decimal::from(total);
    let confidence = if total == 0 {
        Decimal::ZERO
    } else {
        n / (n + cfg.confidence_k)
    };

    WhaleBehavioralProfile {
        address: address.to_string(),
        chain: chain.map(str::to_string),
        behavior_label: label.as_str().to_string(),
        behavior_confidence: confidence,
        success_rate,
        avg_reaction_latency_mins: latency,
        trades_before_news,
        trades_during_fear,
        trades_during_greed,
        total_transactions: total,
        resolved_transactions: resolved_count,
        updated_at: now,
    }
}

/// Rule-based label assignment, evaluated in a fixed priority order so a
/// history matching several rules gets exactly one label.
fn assign_label(
    total: i32,
    success_rate: Option<Decimal>,
    latency: Option<Decimal>,
    trades_before_news: i32,
    trades_during_fear: i32,
    cfg: &ProfilerConfig,
) -> WhaleBehavior {
    if total == 0 {
        return WhaleBehavior::Mixed;
    }

    let before_news_ratio = Decimal::from(trades_before_news) / Decimal::from(total);
    let fear_dominates = trades_during_fear * 2 > total;

    // 1. Front-runner: consistently in 1-2h before news, fast off the mark.
    if before_news_ratio >= cfg.front_runner_ratio
        && latency.map_or(false, |l| l <= cfg.low_latency_mins)
    {
        return WhaleBehavior::NewsFrontRunner;
    }

    let Some(success) = success_rate else {
        // No resolved outcome yet: nothing to judge skill on.
        return WhaleBehavior::Mixed;
    };

    // 2. Accumulator: buys fear, and it works.
    if success >= cfg.high_success_rate && fear_dominates {
        return WhaleBehavior::Accumulator;
    }

    // 3. Panic seller: trades fear, and it doesn't.
    if fear_dominates && success < cfg.low_success_rate {
        return WhaleBehavior::PanicSeller;
    }

    // 4. Value hunter: skilled but slow to react — positioned ahead of
    //    the crowd, not chasing headlines. No observed spike reaction at
    //    all reads as maximally slow.
    if success >= cfg.high_success_rate
        && latency.map_or(true, |l| l >= cfg.high_latency_mins)
    {
        return WhaleBehavior::ValueHunter;
    }

    WhaleBehavior::Mixed
}

/// Median minutes between the most recent sentiment spike preceding each
/// trade and the trade itself. Trades with no preceding spike are
/// excluded; `None` when nothing can be measured.
fn median_reaction_latency(
    txs: &[&WhaleTransaction],
    spikes: &[DateTime<Utc>],
) -> Option<Decimal> {
    let mut latencies: Vec<i64> = txs
        .iter()
        .filter_map(|tx| {
            spikes
                .iter()
                .filter(|s| **s <= tx.executed_at)
                .max()
                .map(|s| (tx.executed_at - *s).num_minutes())
        })
        .collect();

    if latencies.is_empty() {
        return None;
    }

    latencies.sort_unstable();
    let mid = latencies.len() / 2;
    let median = if latencies.len() % 2 == 0 {
        Decimal::from(latencies[mid - 1] + latencies[mid]) / Decimal::from(2)
    } else {
        Decimal::from(latencies[mid])
    };
    Some(median)
}

fn is_before_news(
    executed_at: DateTime<Utc>,
    news_events: &[DateTime<Utc>],
    (lead_min, lead_max): (i64, i64),
) -> bool {
    news_events.iter().any(|news| {
        let lead = (*news - executed_at).num_minutes();
        lead >= lead_min && lead <= lead_max
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_tx(
        sentiment: i64,
        profit_pct: Option<i64>,
        hours_ago: i64,
        now: DateTime<Utc>,
    ) -> WhaleTransaction {
        let executed_at = now - Duration::hours(hours_ago);
        WhaleTransaction {
            id: Uuid::new_v4(),
            address: "0xabc".into(),
            chain: Some("ethereum".into()),
            asset_id: "bitcoin".into(),
            direction: "buy".into(),
            usd_value: Decimal::from(250_000),
            price_at_tx: Some(Decimal::from(60_000)),
            change_24h_at_tx: None,
            rsi_at_tx: None,
            sentiment_at_tx: Some(Decimal::from(sentiment)),
            price_after_24h: profit_pct.map(|_| Decimal::from(61_000)),
            price_after_7d: profit_pct.map(|_| Decimal::from(62_000)),
            profit_pct: profit_pct.map(Decimal::from),
            resolved_at: profit_pct.map(|_| now),
            executed_at,
            created_at: Some(executed_at),
        }
    }

    #[test]
    fn test_scenario_d_accumulator_with_low_confidence() {
        let now = Utc::now();
        // 3 resolved trades, 2 profitable, all during fear.
        let txs = vec![
            make_tx(25, Some(8), 72, now),
            make_tx(22, Some(5), 48, now),
            make_tx(28, Some(-3), 24, now),
        ];
        let profile = build_profile(
            "0xabc",
            Some("ethereum"),
            &txs,
            &[],
            &[],
            &ProfilerConfig::default(),
            now,
        );

        // 2/3 profitable.
        assert_eq!(
            profile.success_rate,
            Some(Decimal::from(2) / Decimal::from(3))
        );
        assert_eq!(profile.trades_during_fear, 3);
        assert_eq!(profile.behavior_label, "accumulator");
        // Only 3 transactions: confidence stays low (3/13).
        assert!(profile.behavior_confidence < Decimal::new(25, 2));
    }

    #[test]
    fn test_unresolved_transactions_never_move_success_rate() {
        let now = Utc::now();
        let mut txs = vec![make_tx(50, Some(10), 48, now)];
        let profile_before = build_profile(
            "0xabc", None, &txs, &[], &[], &ProfilerConfig::default(), now,
        );

        txs.push(make_tx(50, None, 2, now)); // unresolved
        let profile_after = build_profile(
            "0xabc", None, &txs, &[], &[], &ProfilerConfig::default(), now,
        );

        assert_eq!(profile_before.success_rate, profile_after.success_rate);
        assert_eq!(profile_after.resolved_transactions, 1);
        assert_eq!(profile_after.total_transactions, 2);
    }

    #[test]
    fn test_replayed_transaction_is_idempotent() {
        let now = Utc::now();
        let tx = make_tx(25, Some(10), 24, now);
        let once = build_profile(
            "0xabc", None, &[tx.clone()], &[], &[], &ProfilerConfig::default(), now,
        );
        let twice = build_profile(
            "0xabc",
            None,
            &[tx.clone(), tx],
            &[],
            &[],
            &ProfilerConfig::default(),
            now,
        );

        assert_eq!(once.success_rate, twice.success_rate);
        assert_eq!(once.total_transactions, twice.total_transactions);
        assert_eq!(once.trades_during_fear, twice.trades_during_fear);
    }

    #[test]
    fn test_panic_seller_label() {
        let now = Utc::now();
        let txs = vec![
            make_tx(20, Some(-5), 96, now),
            make_tx(25, Some(-8), 72, now),
            make_tx(18, Some(-2), 48, now),
            make_tx(26, Some(4), 24, now),
        ];
        let profile = build_profile(
            "0xdead", None, &txs, &[], &[], &ProfilerConfig::default(), now,
        );
        assert_eq!(profile.behavior_label, "panic_seller");
    }

    #[test]
    fn test_front_runner_takes_priority() {
        let now = Utc::now();
        let cfg = ProfilerConfig::default();

        // Trades 90 minutes before each news event, reacting within 30
        // minutes of a sentiment spike. Profitable fear trades too — the
        // priority order must still pick front-runner.
        let mut txs = Vec::new();
        let mut spikes = Vec::new();
        let mut news = Vec::new();
        for i in 0..4 {
            let executed = now - Duration::hours(24 * (i + 1));
            spikes.push(executed - Duration::minutes(30));
            news.push(executed + Duration::minutes(90));
            let mut tx = make_tx(25, Some(10), 0, now);
            tx.executed_at = executed;
            txs.push(tx);
        }

        let profile = build_profile("0xfast", None, &txs, &spikes, &news, &cfg, now);
        assert_eq!(profile.trades_before_news, 4);
        assert_eq!(profile.behavior_label, "news_front_runner");
    }

    #[test]
    fn test_value_hunter_when_skilled_and_slow() {
        let now = Utc::now();
        let cfg = ProfilerConfig::default();

        // Profitable trades during neutral sentiment, reacting ~8h after
        // any spike.
        let mut txs = Vec::new();
        let mut spikes = Vec::new();
        for i in 0..4 {
            let executed = now - Duration::hours(24 * (i + 1));
            spikes.push(executed - Duration::hours(8));
            let mut tx = make_tx(50, Some(12), 0, now);
            tx.executed_at = executed;
            txs.push(tx);
        }

        let profile = build_profile("0xslow", None, &txs, &spikes, &[], &cfg, now);
        assert_eq!(profile.behavior_label, "value_hunter");
    }

    #[test]
    fn test_empty_history_is_mixed_with_zero_confidence() {
        let now = Utc::now();
        let profile = build_profile(
            "0xnew", None, &[], &[], &[], &ProfilerConfig::default(), now,
        );
        assert_eq!(profile.behavior_label, "mixed");
        assert_eq!(profile.behavior_confidence, Decimal::ZERO);
        assert_eq!(profile.success_rate, None);
    }

    #[test]
    fn test_confidence_saturates_with_sample_size() {
        let now = Utc::now();
        let cfg = ProfilerConfig::default();

        let few: Vec<WhaleTransaction> =
            (0..3).map(|i| make_tx(50, Some(5), i + 1, now)).collect();
        let many: Vec<WhaleTransaction> =
            (0..60).map(|i| make_tx(50, Some(5), i + 1, now)).collect();

        let p_few = build_profile("0x1", None, &few, &[], &[], &cfg, now);
        let p_many = build_profile("0x2", None, &many, &[], &[], &cfg, now);

        assert!(p_many.behavior_confidence > p_few.behavior_confidence);
        assert!(p_many.behavior_confidence < Decimal::ONE);
    }
}
