use std::collections::BTreeMap;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use metrics::{counter, gauge};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::time::{interval, Duration};

use crate::config::AppConfig;
use crate::db::{golden_repo, news_repo, profile_repo, sentiment_repo, whale_tx_repo};
use crate::engine::golden::resolve_outcome;
use crate::engine::profiler::build_profile;
use crate::models::{GoldenShadowSignal, TxDirection, WhaleTransaction};

/// Historical price lookup, implemented by the external price feed.
pub trait PriceSource: Send + Sync {
    fn price_at(
        &self,
        asset_id: &str,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = anyhow::Result<Option<Decimal>>> + Send;
}

/// Periodic reconciliation: fill whale-transaction outcomes once their
/// windows elapse, rebuild the affected profiles, and settle pending
/// golden-shadow signals.
pub async fn run_reconciliation_poller<P: PriceSource>(
    pool: PgPool,
    price_source: P,
    config: AppConfig,
) {
    let mut ticker = interval(Duration::from_secs(config.reconciliation_interval_secs));

    loop {
        ticker.tick().await;

        if let Err(e) = reconcile_whale_transactions(&pool, &price_source, &config).await {
            tracing::error!(error = %e, "Whale transaction reconciliation failed");
        }
        if let Err(e) = reconcile_golden_signals(&pool, &price_source).await {
            tracing::error!(error = %e, "Golden signal reconciliation failed");
        }
    }
}

/// Second phase of the whale-transaction two-phase write, then a profile
/// rebuild per touched address.
///
/// Addresses are processed strictly one at a time, so two resolving
/// transactions can never race on the same profile; different addresses
/// only ever see their own rows.
pub async fn reconcile_whale_transactions<P: PriceSource>(
    pool: &PgPool,
    price_source: &P,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let now = Utc::now();
    // Only transactions whose full 7d window has elapsed resolve, so the
    // outcome is written exactly once and never revisited.
    let cutoff = now - ChronoDuration::days(7);
    let unresolved = whale_tx_repo::get_unresolved_before(pool, cutoff).await?;

    if unresolved.is_empty() {
        return Ok(());
    }

    let mut by_address: BTreeMap<String, Vec<WhaleTransaction>> = BTreeMap::new();
    for tx in unresolved {
        by_address.entry(tx.address.clone()).or_default().push(tx);
    }

    for (address, txs) in by_address {
        let mut resolved_any = false;

        for tx in &txs {
            let Some(price_at_tx) = tx.price_at_tx else {
                tracing::debug!(
                    tx_id = %tx.id,
                    address = %address,
                    "No entry price captured, cannot judge outcome"
                );
                continue;
            };
            if price_at_tx.is_zero() {
                continue;
            }

            let Some((p24, p7)) = outcome_prices(price_source, &tx.asset_id, tx.executed_at).await
            else {
                continue;
            };

            let profit_pct = profit_for(tx.direction_enum(), price_at_tx, p7);

            let applied =
                whale_tx_repo::resolve_transaction(pool, tx.id, p24, Some(p7), profit_pct, now)
                    .await?;
            if applied {
                resolved_any = true;
                counter!("whale_transactions_resolved").increment(1);
                tracing::info!(
                    tx_id = %tx.id,
                    address = %address,
                    profit_pct = %profit_pct,
                    "Whale transaction resolved"
                );
            }
        }

        if resolved_any {
            if let Err(e) = rebuild_profile(pool, &address, &txs, config, now).await {
                tracing::error!(error = %e, address = %address, "Profile rebuild failed");
            }
        }
    }

    Ok(())
}

/// Outcome prices for one transaction. A feed failure or a missing 7d
/// candle skips just this transaction; the rest of the batch still
/// resolves and the skipped one retries next tick.
async fn outcome_prices<P: PriceSource>(
    price_source: &P,
    asset_id: &str,
    executed_at: DateTime<Utc>,
) -> Option<(Option<Decimal>, Decimal)> {
    let p24 = match price_source
        .price_at(asset_id, executed_at + ChronoDuration::hours(24))
        .await
    {
        Ok(p) => p,
        Err(e) => {
            counter!("price_feed_failures_total").increment(1);
            tracing::warn!(error = %e, asset = %asset_id, "24h price lookup failed, skipping for this cycle");
            return None;
        }
    };

    match price_source
        .price_at(asset_id, executed_at + ChronoDuration::days(7))
        .await
    {
        Ok(Some(p7)) => Some((p24, p7)),
        Ok(None) => {
            tracing::debug!(asset = %asset_id, "7d price not yet available, will retry");
            None
        }
        Err(e) => {
            counter!("price_feed_failures_total").increment(1);
            tracing::warn!(error = %e, asset = %asset_id, "7d price lookup failed, skipping for this cycle");
            None
        }
    }
}

/// Signed return in percent, by trade direction: a sell profits when
/// price falls. Transfers are judged like buys (coins kept off
/// exchanges are a long).
fn profit_for(direction: Option<TxDirection>, price_at_tx: Decimal, price_after: Decimal) -> Decimal {
    let hundred = Decimal::from(100);
    let change = (price_after - price_at_tx) / price_at_tx * hundred;
    match direction {
        Some(TxDirection::Sell) => -change,
        _ => change,
    }
}

/// Full profile recompute for one address from its persisted history.
async fn rebuild_profile(
    pool: &PgPool,
    address: &str,
    touched: &[WhaleTransaction],
    config: &AppConfig,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let history = whale_tx_repo::get_by_address(pool, address).await?;

    // Spike and news timelines span every asset this address trades.
    let mut asset_ids: Vec<&str> = history.iter().map(|t| t.asset_id.as_str()).collect();
    asset_ids.sort_unstable();
    asset_ids.dedup();

    let since = history
        .first()
        .map(|t| t.executed_at)
        .unwrap_or(now - ChronoDuration::days(90));

    let mut spikes = Vec::new();
    let mut news = Vec::new();
    for asset_id in asset_ids {
        spikes.extend(
            sentiment_repo::get_spike_timeline(
                pool,
                asset_id,
                config.profiler.fear_threshold,
                config.profiler.greed_threshold,
            )
            .await?,
        );
        news.extend(news_repo::get_timeline(pool, asset_id, since).await?);
    }
    spikes.sort_unstable();
    news.sort_unstable();

    let chain = touched.iter().find_map(|t| t.chain.as_deref());
    let profile = build_profile(address, chain, &history, &spikes, &news, &config.profiler, now);

    tracing::info!(
        address = %address,
        behavior = %profile.behavior_label,
        confidence = %profile.behavior_confidence,
        success_rate = ?profile.success_rate,
        resolved = profile.resolved_transactions,
        "Whale profile rebuilt"
    );

    profile_repo::upsert_profile(pool, &profile).await
}

/// Observe outcome prices for pending golden-shadow signals and settle
/// the ones whose evaluation window has closed or that hit a band.
pub async fn reconcile_golden_signals<P: PriceSource>(
    pool: &PgPool,
    price_source: &P,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let pending = golden_repo::list_pending(pool).await?;
    gauge!("pending_golden_signals").set(pending.len() as f64);

    for signal in pending {
        let Some(updated) = observe_due_prices(price_source, &signal, now).await else {
            continue;
        };

        match resolve_outcome(&updated, now) {
            Some(outcome) => {
                let applied = golden_repo::update_outcome(
                    pool,
                    updated.id,
                    outcome,
                    updated.actual_price_24h,
                    updated.actual_price_7d,
                    now,
                )
                .await?;
                if applied {
                    tracing::info!(
                        signal_id = %updated.id,
                        asset = %updated.asset_id,
                        outcome = %outcome,
                        "Golden shadow signal settled"
                    );
                }
            }
            None => {
                // Keep any newly observed price so the next pass can
                // settle without refetching.
                if updated.actual_price_24h != signal.actual_price_24h
                    || updated.actual_price_7d != signal.actual_price_7d
                {
                    golden_repo::record_observed_prices(
                        pool,
                        updated.id,
                        updated.actual_price_24h,
                        updated.actual_price_7d,
                    )
                    .await?;
                }
            }
        }
    }

    Ok(())
}

/// Fill any newly due outcome price on a pending signal. A feed failure
/// returns `None` and the signal waits for the next pass untouched, so
/// an unreachable feed can never settle an expired window as a failure.
async fn observe_due_prices<P: PriceSource>(
    price_source: &P,
    signal: &GoldenShadowSignal,
    now: DateTime<Utc>,
) -> Option<GoldenShadowSignal> {
    let mut updated = signal.clone();

    if updated.actual_price_24h.is_none()
        && now >= updated.signal_timestamp + ChronoDuration::hours(24)
    {
        match price_source
            .price_at(&updated.asset_id, updated.signal_timestamp + ChronoDuration::hours(24))
            .await
        {
            Ok(p) => updated.actual_price_24h = p,
            Err(e) => {
                counter!("price_feed_failures_total").increment(1);
                tracing::warn!(error = %e, signal_id = %updated.id, "24h price lookup failed, deferring signal");
                return None;
            }
        }
    }
    if updated.actual_price_7d.is_none()
        && now >= updated.signal_timestamp + ChronoDuration::days(7)
    {
        match price_source
            .price_at(&updated.asset_id, updated.signal_timestamp + ChronoDuration::days(7))
            .await
        {
            Ok(p) => updated.actual_price_7d = p,
            Err(e) => {
                counter!("price_feed_failures_total").increment(1);
                tracing::warn!(error = %e, signal_id = %updated.id, "7d price lookup failed, deferring signal");
                return None;
            }
        }
    }

    Some(updated)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    struct FixedSource(Decimal);

    impl PriceSource for FixedSource {
        async fn price_at(
            &self,
            _asset_id: &str,
            _at: DateTime<Utc>,
        ) -> anyhow::Result<Option<Decimal>> {
            Ok(Some(self.0))
        }
    }

    struct FailingSource;

    impl PriceSource for FailingSource {
        async fn price_at(
            &self,
            _asset_id: &str,
            _at: DateTime<Utc>,
        ) -> anyhow::Result<Option<Decimal>> {
            anyhow::bail!("connection refused")
        }
    }

    fn pending_signal(signal_timestamp: DateTime<Utc>) -> GoldenShadowSignal {
        GoldenShadowSignal {
            id: Uuid::new_v4(),
            asset_id: "bitcoin".into(),
            signal_timestamp,
            signal_type: "entry".into(),
            intent_score: Decimal::from(85),
            divergence_type: "shadow_accumulation".into(),
            entry_price: Decimal::from(50_000),
            stop_price: Decimal::from(48_500),
            target_price: Decimal::from(53_000),
            outcome: "pending".into(),
            actual_price_24h: None,
            actual_price_7d: None,
            expires_at: signal_timestamp + ChronoDuration::days(7),
            resolved_at: None,
        }
    }

    #[tokio::test]
    async fn test_feed_failure_skips_transaction_without_poisoning_batch() {
        let executed_at = Utc::now() - ChronoDuration::days(10);

        // A failing lookup yields no prices for this transaction only.
        assert_eq!(
            outcome_prices(&FailingSource, "bitcoin", executed_at).await,
            None
        );

        // The same call against a working feed still resolves.
        let price = Decimal::from(50_000);
        assert_eq!(
            outcome_prices(&FixedSource(price), "bitcoin", executed_at).await,
            Some((Some(price), price))
        );
    }

    #[tokio::test]
    async fn test_feed_failure_defers_pending_signal_untouched() {
        let signal = pending_signal(Utc::now() - ChronoDuration::days(8));

        assert!(observe_due_prices(&FailingSource, &signal, Utc::now())
            .await
            .is_none());

        let price = Decimal::from(60_000);
        let updated = observe_due_prices(&FixedSource(price), &signal, Utc::now())
            .await
            .unwrap();
        assert_eq!(updated.actual_price_24h, Some(price));
        assert_eq!(updated.actual_price_7d, Some(price));
    }

    #[test]
    fn test_profit_sign_by_direction() {
        let p0 = Decimal::from(100);
        let up = Decimal::from(110);
        let down = Decimal::from(90);

        assert_eq!(
            profit_for(Some(TxDirection::Buy), p0, up),
            Decimal::from(10)
        );
        assert_eq!(
            profit_for(Some(TxDirection::Sell), p0, down),
            Decimal::from(10)
        );
        assert_eq!(
            profit_for(Some(TxDirection::Sell), p0, up),
            Decimal::from(-10)
        );
        assert_eq!(
            profit_for(Some(TxDirection::Transfer), p0, up),
            Decimal::from(10)
        );
    }
}
