use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::{asset_repo, news_repo, onchain_repo, sentiment_repo, technical_repo, whale_tx_repo};
use crate::engine::technical::{aggregate, IndicatorInputs};
use crate::models::{
    AssetSnapshot, CrowdAction, EmotionalTone, IndicatorSnapshot, Timeframe, TxDirection,
    WhaleTransaction,
};

/// One indicator payload from the upstream indicator pipeline.
#[derive(Debug, Clone)]
pub struct IndicatorUpdate {
    pub asset_id: String,
    pub timeframe: Timeframe,
    pub inputs: IndicatorInputs,
}

/// One classified whale movement from the block-explorer feed.
#[derive(Debug, Clone)]
pub struct WhaleTxEvent {
    pub address: String,
    pub chain: Option<String>,
    pub asset_id: String,
    pub direction: TxDirection,
    pub usd_value: Decimal,
    pub executed_at: DateTime<Utc>,
}

/// Run one indicator payload through the technical aggregator and
/// persist the result.
///
/// When the aggregator reports insufficient data the stored score is
/// nulled out rather than left standing — a stale number is worse than
/// an honest null.
pub async fn process_indicator_update(
    update: &IndicatorUpdate,
    pool: &PgPool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let result = aggregate(
        &update.inputs,
        &config.vote_weights,
        &config.technical_breakpoints,
    );

    let (score, signal) = match result {
        Some((score, signal)) => (Some(score), Some(signal)),
        None => {
            counter!("insufficient_data_total").increment(1);
            tracing::debug!(
                asset = %update.asset_id,
                timeframe = %update.timeframe,
                candles = update.inputs.candle_count,
                "Insufficient indicator data, storing null score"
            );
            (None, None)
        }
    };

    let snapshot = IndicatorSnapshot {
        rsi: update.inputs.rsi,
        macd_histogram: update.inputs.macd_histogram,
        trend: update.inputs.trend,
        pattern_name: update.inputs.pattern_name.clone(),
        pattern_direction: update.inputs.pattern_direction,
        pattern_reliability: update.inputs.pattern_reliability,
        rsi_divergence: update.inputs.rsi_divergence,
    };

    technical_repo::upsert_score(
        pool,
        &update.asset_id,
        update.timeframe,
        score,
        signal,
        &snapshot,
        Utc::now(),
    )
    .await?;

    if let (Some(score), Some(signal)) = (score, signal) {
        tracing::info!(
            asset = %update.asset_id,
            timeframe = %update.timeframe,
            score = %score,
            signal = %signal,
            "Technical score updated"
        );
    }

    Ok(())
}

/// Persist a whale transaction with the market context captured at
/// ingestion time. Sub-threshold movements are dropped here so the
/// profiler only ever sees whale-grade activity.
pub async fn process_whale_transaction(
    event: &WhaleTxEvent,
    pool: &PgPool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    if event.usd_value < config.whale_usd_threshold {
        tracing::debug!(
            address = %event.address,
            usd_value = %event.usd_value,
            "Transaction below whale threshold, skipping"
        );
        return Ok(());
    }

    let now = Utc::now();

    // Capture market context as of ingestion. Missing context stays
    // null; the profiler treats such trades as context-free.
    let snapshot = asset_repo::get_snapshot(pool, &event.asset_id).await?;
    let sentiment = sentiment_repo::get_latest_fresh(
        pool,
        &event.asset_id,
        now,
        config.sentiment_staleness_secs,
    )
    .await?;
    let rsi_at_tx = technical_repo::get_fresh_scores(
        pool,
        &event.asset_id,
        now,
        config.technical_staleness_secs,
    )
    .await?
    .iter()
    .find(|s| s.timeframe_enum() == Some(Timeframe::H1))
    .and_then(|s| s.rsi);

    let tx = WhaleTransaction {
        id: Uuid::new_v4(),
        address: event.address.clone(),
        chain: event.chain.clone(),
        asset_id: event.asset_id.clone(),
        direction: event.direction.as_str().to_string(),
        usd_value: event.usd_value,
        price_at_tx: snapshot.as_ref().map(|s| s.price),
        change_24h_at_tx: snapshot.as_ref().and_then(|s| s.change_24h),
        rsi_at_tx,
        sentiment_at_tx: sentiment.map(|s| s.score),
        price_after_24h: None,
        price_after_7d: None,
        profit_pct: None,
        resolved_at: None,
        executed_at: event.executed_at,
        created_at: None,
    };

    whale_tx_repo::insert_transaction(pool, &tx).await?;
    counter!("whale_transactions_ingested").increment(1);

    tracing::info!(
        address = %event.address,
        asset = %event.asset_id,
        direction = %event.direction,
        usd_value = %event.usd_value,
        "Whale transaction recorded"
    );

    Ok(())
}

/// One sentiment analysis result from the sentiment engine.
#[derive(Debug, Clone)]
pub struct SentimentUpdate {
    pub asset_id: String,
    pub score: Decimal,
    pub tone: EmotionalTone,
    pub crowd_action: CrowdAction,
    pub intensity: i32,
    pub dominant_category: Option<String>,
    pub confidence: Decimal,
    pub analyzed_at: DateTime<Utc>,
}

/// Append one sentiment run to the score store.
pub async fn process_sentiment_update(update: &SentimentUpdate, pool: &PgPool) -> anyhow::Result<()> {
    sentiment_repo::insert_score(
        pool,
        &update.asset_id,
        update.score,
        update.tone.as_str(),
        update.crowd_action.as_str(),
        update.intensity,
        update.dominant_category.as_deref(),
        update.confidence,
        update.analyzed_at,
    )
    .await?;

    tracing::info!(
        asset = %update.asset_id,
        score = %update.score,
        tone = %update.tone,
        crowd_action = %update.crowd_action,
        "Sentiment score recorded"
    );

    Ok(())
}

/// One on-chain collector run for an asset.
#[derive(Debug, Clone)]
pub struct OnchainUpdate {
    pub asset_id: String,
    pub whale_signal: Option<String>,
    pub whale_inflow: Option<Decimal>,
    pub whale_outflow: Option<Decimal>,
    pub dau_trend: Option<String>,
    pub holder_accumulation: Option<Decimal>,
    pub overall_signal: Option<String>,
    pub bullish_probability: Option<Decimal>,
}

/// Refresh the on-chain signal row for an asset. Self-contradictory flow
/// readings are stored as delivered and flagged; the read side degrades
/// them to insufficient rather than trusting a repaired value.
pub async fn process_onchain_update(update: &OnchainUpdate, pool: &PgPool) -> anyhow::Result<()> {
    let negative_flow = update.whale_inflow.map_or(false, |v| v < Decimal::ZERO)
        || update.whale_outflow.map_or(false, |v| v < Decimal::ZERO);
    if negative_flow {
        counter!("inconsistent_input_total").increment(1);
        tracing::warn!(
            asset = %update.asset_id,
            inflow = ?update.whale_inflow,
            outflow = ?update.whale_outflow,
            "On-chain feed delivered a negative flow magnitude"
        );
    }

    onchain_repo::upsert_score(
        pool,
        &update.asset_id,
        update.whale_signal.as_deref(),
        update.whale_inflow,
        update.whale_outflow,
        update.dau_trend.as_deref(),
        update.holder_accumulation,
        update.overall_signal.as_deref(),
        update.bullish_probability,
        Utc::now(),
    )
    .await?;

    tracing::info!(
        asset = %update.asset_id,
        bullish_probability = ?update.bullish_probability,
        "On-chain signal updated"
    );

    Ok(())
}

/// Refresh the market snapshot for an asset from the price feed.
pub async fn process_market_snapshot(snapshot: &AssetSnapshot, pool: &PgPool) -> anyhow::Result<()> {
    asset_repo::upsert_snapshot(pool, snapshot).await?;

    tracing::debug!(
        asset = %snapshot.asset_id,
        price = %snapshot.price,
        "Market snapshot updated"
    );

    Ok(())
}

/// Record a news event from the upstream scraper, for the profiler's
/// front-running detection.
pub async fn process_news_event(
    asset_id: &str,
    category: Option<&str>,
    published_at: DateTime<Utc>,
    pool: &PgPool,
) -> anyhow::Result<()> {
    news_repo::record_event(pool, asset_id, category, published_at).await?;

    tracing::debug!(asset = %asset_id, category = ?category, "News event recorded");
    Ok(())
}
