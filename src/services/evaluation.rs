use std::time::Instant;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures_util::stream::{self, StreamExt};
use metrics::{counter, gauge, histogram};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::time::{interval, timeout, Duration};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::{
    asset_repo, divergence_repo, golden_repo, onchain_repo, profile_repo, sentiment_repo,
    technical_repo, whale_tx_repo,
};
use crate::engine::blender::{blend, AsiScores, TimeframeScores};
use crate::engine::divergence::{classify, intent_score, DivergenceRead};
use crate::engine::golden::{build_signal, should_suppress};
use crate::errors::EngineError;
use crate::models::{AssetSnapshot, OnchainScore, SentimentScore, WhaleBehavior};
use crate::services::narrative::{NarrativeClient, NarrativeContext};

/// Activity window for counting corroborating whale addresses.
const ACTIVE_WHALE_WINDOW_HOURS: i64 = 168;

/// Cyclic divergence evaluation: one pass over all tracked assets per
/// tick, each asset independent of the others.
pub async fn run_divergence_scheduler(
    pool: PgPool,
    config: AppConfig,
    narrative: Option<NarrativeClient>,
) {
    let mut ticker = interval(Duration::from_secs(config.divergence_interval_secs));

    loop {
        ticker.tick().await;
        run_pass(&pool, &config, narrative.as_ref()).await;
    }
}

/// One pass over every tracked asset, fanned out over a bounded worker
/// pool. A failing or timed-out asset is skipped for the cycle; rows it
/// committed before the cutoff stand, nothing is rolled back or
/// overwritten with partial state.
pub async fn run_pass(pool: &PgPool, config: &AppConfig, narrative: Option<&NarrativeClient>) {
    let assets = match asset_repo::list_asset_ids(pool).await {
        Ok(assets) => assets,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list assets for evaluation pass");
            return;
        }
    };

    gauge!("tracked_assets").set(assets.len() as f64);

    // Single as-of timestamp for the whole pass so no asset mixes a
    // fresh sentiment row with a technical row it could not have seen.
    let as_of = Utc::now();
    let eval_timeout = Duration::from_secs(config.eval_timeout_secs);

    stream::iter(assets)
        .for_each_concurrent(config.eval_concurrency, |asset_id| async move {
            let result = timeout(
                eval_timeout,
                evaluate_asset(pool, config, narrative, &asset_id, as_of),
            )
            .await;

            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!(error = %e, asset = %asset_id, "Evaluation failed, skipping cycle");
                }
                Err(_) => {
                    tracing::warn!(asset = %asset_id, "Evaluation timed out, skipping cycle");
                }
            }
        })
        .await;
}

/// Compute the multi-horizon ASI for one asset from the score store,
/// reading everything as of one snapshot instant.
pub async fn compute_asi(
    pool: &PgPool,
    config: &AppConfig,
    asset_id: &str,
    as_of: DateTime<Utc>,
) -> Result<AsiScores, EngineError> {
    let technical =
        technical_repo::get_fresh_scores(pool, asset_id, as_of, config.technical_staleness_secs)
            .await?;

    let mut timeframes = TimeframeScores::default();
    for row in &technical {
        if let Some(tf) = row.timeframe_enum() {
            timeframes.set(tf, row.score);
        }
    }

    let sentiment =
        sentiment_repo::get_latest_fresh(pool, asset_id, as_of, config.sentiment_staleness_secs)
            .await?
            .map(|s| s.score);

    let onchain = onchain_repo::get_fresh(pool, asset_id, as_of, config.onchain_staleness_secs)
        .await?
        .as_ref()
        .and_then(onchain_component);

    Ok(blend(
        &timeframes,
        sentiment,
        onchain,
        &config.blend_weights,
        &config.asi_breakpoints,
    ))
}

/// On-chain component for the blend. A self-contradictory row degrades
/// to no component, which the blend renormalizes around; a repaired or
/// defaulted value is never substituted.
fn onchain_component(row: &OnchainScore) -> Option<Decimal> {
    if !row.is_consistent() {
        tracing::debug!(
            asset = %row.asset_id,
            "Inconsistent on-chain flows, blending without the on-chain component"
        );
        return None;
    }
    row.bullish_probability
}

/// Read the divergence inputs for one asset, classifying exactly why
/// they are unusable when they are.
async fn divergence_inputs(
    pool: &PgPool,
    config: &AppConfig,
    asset_id: &str,
    as_of: DateTime<Utc>,
) -> Result<(SentimentScore, OnchainScore, Decimal), EngineError> {
    let sentiment =
        sentiment_repo::get_latest_fresh(pool, asset_id, as_of, config.sentiment_staleness_secs)
            .await?
            .ok_or_else(|| {
                EngineError::InsufficientData(format!("no fresh sentiment for {asset_id}"))
            })?;

    let onchain = onchain_repo::get_fresh(pool, asset_id, as_of, config.onchain_staleness_secs)
        .await?
        .ok_or_else(|| {
            EngineError::InsufficientData(format!("no fresh on-chain state for {asset_id}"))
        })?;

    if !onchain.is_consistent() {
        return Err(EngineError::InconsistentInput(format!(
            "negative on-chain flow magnitude for {asset_id}"
        )));
    }

    let net_flow = onchain
        .whale_net_flow
        .ok_or_else(|| EngineError::InsufficientData(format!("no whale net flow for {asset_id}")))?;

    Ok((sentiment, onchain, net_flow))
}

/// One divergence evaluation for one asset: read sentiment, whale flow
/// and the active address profiles as of the pass instant, classify,
/// log, and promote through the golden-signal gate.
pub async fn evaluate_asset(
    pool: &PgPool,
    config: &AppConfig,
    narrative: Option<&NarrativeClient>,
    asset_id: &str,
    as_of: DateTime<Utc>,
) -> anyhow::Result<()> {
    let start = Instant::now();

    // Blend first so the pass reports the current ASI state even for
    // assets that end up skipping the divergence evaluation.
    let asi = compute_asi(pool, config, asset_id, as_of).await?;
    tracing::debug!(
        asset = %asset_id,
        combined = ?asi.asi_combined,
        status = %asi.data_status.combined,
        "ASI blended"
    );

    let (sentiment, onchain, net_flow) =
        match divergence_inputs(pool, config, asset_id, as_of).await {
            Ok(inputs) => inputs,
            Err(e @ EngineError::InsufficientData(_)) => {
                counter!("insufficient_data_total").increment(1);
                tracing::debug!(asset = %asset_id, error = %e, "Skipping divergence this cycle");
                return Ok(());
            }
            Err(e @ EngineError::InconsistentInput(_)) => {
                counter!("inconsistent_input_total").increment(1);
                tracing::warn!(asset = %asset_id, error = %e, "Skipping divergence this cycle");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

    // Dominant behavior: the best-established profile among addresses
    // active on this asset inside the window.
    let window_start = as_of - ChronoDuration::hours(ACTIVE_WHALE_WINDOW_HOURS);
    let addresses = whale_tx_repo::get_active_addresses(pool, asset_id, window_start).await?;
    let profiles = profile_repo::get_profiles(pool, &addresses).await?;
    let active_whale_count = addresses.len() as i32;

    let (dominant_behavior, dominant_confidence) = profiles
        .first()
        .map(|p| {
            (
                p.behavior_enum().unwrap_or(WhaleBehavior::Mixed),
                p.behavior_confidence,
            )
        })
        .unwrap_or((WhaleBehavior::Mixed, Decimal::ZERO));

    let divergence = classify(sentiment.score, net_flow, dominant_behavior, &config.divergence);
    let read = DivergenceRead {
        sentiment_score: sentiment.score,
        whale_net_flow: net_flow,
        dominant_behavior,
        dominant_confidence,
        active_whale_count,
    };
    let intent = intent_score(&read, &config.divergence);

    // Narrative insight is best-effort: a failed call leaves the field
    // null and never blocks the log write.
    let insight = match narrative {
        Some(client) => {
            client
                .generate(&NarrativeContext {
                    asset_id: asset_id.to_string(),
                    sentiment_score: sentiment.score,
                    crowd_action: Some(sentiment.crowd_action.clone()),
                    whale_net_flow: net_flow,
                    divergence_type: divergence.as_str().to_string(),
                    dominant_behavior: Some(dominant_behavior.as_str().to_string()),
                })
                .await
        }
        None => None,
    };

    let log = crate::models::IntentDivergenceLog {
        id: Uuid::new_v4(),
        asset_id: asset_id.to_string(),
        evaluated_at: as_of,
        sentiment_score: Some(sentiment.score),
        crowd_action: Some(sentiment.crowd_action.clone()),
        whale_score: onchain.bullish_probability,
        whale_net_flow: Some(net_flow),
        divergence_type: divergence.as_str().to_string(),
        intent_score: intent,
        dominant_whale_behavior: Some(dominant_behavior.as_str().to_string()),
        active_whale_count,
        insight,
    };

    divergence_repo::insert_log(pool, &log).await?;
    counter!("divergence_evaluations_total").increment(1);

    tracing::info!(
        asset = %asset_id,
        divergence = %divergence,
        intent = %intent,
        sentiment = %sentiment.score,
        net_flow = %net_flow,
        behavior = %dominant_behavior,
        whales = active_whale_count,
        "Divergence evaluated"
    );

    maybe_emit_golden_signal(pool, config, &log, as_of).await?;

    histogram!("evaluation_latency_seconds").record(start.elapsed().as_secs_f64());
    Ok(())
}

/// Promote a qualifying divergence into a golden-shadow signal, unless
/// an unresolved pending signal for the same underlying event already
/// exists. The suppressed case is deliberate behavior, logged at debug
/// level only.
async fn maybe_emit_golden_signal(
    pool: &PgPool,
    config: &AppConfig,
    log: &crate::models::IntentDivergenceLog,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let Some(divergence) = log.divergence_enum() else {
        return Ok(());
    };
    if !divergence.is_actionable() || log.intent_score < config.golden.intent_threshold {
        return Ok(());
    }

    let window_start = now - ChronoDuration::hours(config.golden.cooldown_hours);
    let recent = golden_repo::get_recent_for_asset(pool, &log.asset_id, window_start).await?;
    if should_suppress(&recent, &log.asset_id, divergence, now, &config.golden) {
        counter!("duplicate_signals_suppressed").increment(1);
        tracing::debug!(
            asset = %log.asset_id,
            divergence = %divergence,
            "Duplicate golden signal suppressed within cooldown"
        );
        return Ok(());
    }

    let Some(snapshot) = asset_repo::get_snapshot(pool, &log.asset_id).await? else {
        counter!("insufficient_data_total").increment(1);
        tracing::debug!(asset = %log.asset_id, "No price snapshot, cannot emit golden signal");
        return Ok(());
    };

    let atr = estimate_atr(&snapshot);
    if let Some(signal) = build_signal(log, snapshot.price, atr, &config.golden, now) {
        golden_repo::insert_signal(pool, &signal).await?;
        counter!("golden_signals_emitted").increment(1);
        tracing::info!(
            asset = %log.asset_id,
            signal_type = %signal.signal_type,
            intent = %log.intent_score,
            entry = %signal.entry_price,
            stop = %signal.stop_price,
            target = %signal.target_price,
            "Golden shadow signal emitted"
        );
    }

    Ok(())
}

/// Volatility proxy for the price band when no candle history is at
/// hand: the 24h move as an absolute range, floored at 1% of price.
fn estimate_atr(snapshot: &AssetSnapshot) -> Decimal {
    let hundred = Decimal::from(100);
    let floor = snapshot.price / hundred;
    let from_change = snapshot
        .change_24h
        .map(|pct| snapshot.price * pct.abs() / hundred)
        .unwrap_or(Decimal::ZERO);
    from_change.max(floor)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn onchain_row(inflow: i64, outflow: i64, bullish: i64) -> OnchainScore {
        OnchainScore {
            asset_id: "bitcoin".into(),
            whale_signal: None,
            whale_net_flow: Some(Decimal::from(inflow - outflow)),
            whale_inflow: Some(Decimal::from(inflow)),
            whale_outflow: Some(Decimal::from(outflow)),
            dau_trend: None,
            holder_accumulation: None,
            overall_signal: None,
            bullish_probability: Some(Decimal::from(bullish)),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_inconsistent_onchain_row_drops_out_of_blend() {
        let good = onchain_row(1_000_000, 400_000, 62);
        assert_eq!(onchain_component(&good), Some(Decimal::from(62)));

        // A negative flow magnitude degrades the component to nothing,
        // even though a bullish probability is present on the row.
        let corrupt = onchain_row(-1_000_000, 400_000, 62);
        assert_eq!(onchain_component(&corrupt), None);
    }
}
