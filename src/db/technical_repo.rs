use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::{IndicatorSnapshot, SignalLabel, TechnicalScore, Timeframe};

/// Upsert the technical score for one (asset, timeframe). Each cycle
/// overwrites the previous row; a null score records "insufficient data"
/// rather than leaving a stale number standing.
#[allow(clippy::too_many_arguments)]
pub async fn upsert_score(
    pool: &PgPool,
    asset_id: &str,
    timeframe: Timeframe,
    score: Option<Decimal>,
    signal: Option<SignalLabel>,
    indicators: &IndicatorSnapshot,
    updated_at: DateTime<Utc>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO technical_scores
            (asset_id, timeframe, score, signal, rsi, macd_histogram, trend,
             pattern_name, pattern_direction, pattern_reliability, rsi_divergence, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (asset_id, timeframe) DO UPDATE SET
            score = EXCLUDED.score,
            signal = EXCLUDED.signal,
            rsi = EXCLUDED.rsi,
            macd_histogram = EXCLUDED.macd_histogram,
            trend = EXCLUDED.trend,
            pattern_name = EXCLUDED.pattern_name,
            pattern_direction = EXCLUDED.pattern_direction,
            pattern_reliability = EXCLUDED.pattern_reliability,
            rsi_divergence = EXCLUDED.rsi_divergence,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(asset_id)
    .bind(timeframe.as_str())
    .bind(score)
    .bind(signal.map(|s| s.as_str()))
    .bind(indicators.rsi)
    .bind(indicators.macd_histogram)
    .bind(indicators.trend.map(|t| t.as_str()))
    .bind(indicators.pattern_name.as_deref())
    .bind(indicators.pattern_direction.map(|d| d.as_str()))
    .bind(indicators.pattern_reliability.map(|r| r.as_str()))
    .bind(indicators.rsi_divergence.map(|d| d.as_str()))
    .bind(updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// All timeframe rows for an asset that are still inside the staleness
/// budget as of the pass timestamp. Stale rows are simply absent, which
/// downstream reads as insufficient data.
pub async fn get_fresh_scores(
    pool: &PgPool,
    asset_id: &str,
    as_of: DateTime<Utc>,
    staleness_secs: i64,
) -> anyhow::Result<Vec<TechnicalScore>> {
    let cutoff = as_of - Duration::seconds(staleness_secs);
    let scores = sqlx::query_as::<_, TechnicalScore>(
        r#"
        SELECT * FROM technical_scores
        WHERE asset_id = $1 AND updated_at >= $2 AND updated_at <= $3
        "#,
    )
    .bind(asset_id)
    .bind(cutoff)
    .bind(as_of)
    .fetch_all(pool)
    .await?;

    Ok(scores)
}
