use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::SentimentScore;

/// Append one sentiment analysis run. The table is append-only history;
/// (asset_id, analyzed_at) is the natural key so a retried insert is a
/// no-op rather than a duplicate.
#[allow(clippy::too_many_arguments)]
pub async fn insert_score(
    pool: &PgPool,
    asset_id: &str,
    score: Decimal,
    tone: &str,
    crowd_action: &str,
    intensity: i32,
    dominant_category: Option<&str>,
    confidence: Decimal,
    analyzed_at: DateTime<Utc>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO sentiment_scores
            (asset_id, score, tone, crowd_action, intensity, dominant_category, confidence, analyzed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (asset_id, analyzed_at) DO NOTHING
        "#,
    )
    .bind(asset_id)
    .bind(score)
    .bind(tone)
    .bind(crowd_action)
    .bind(intensity)
    .bind(dominant_category)
    .bind(confidence)
    .bind(analyzed_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Latest row per asset wins; rows older than the staleness budget as of
/// the pass timestamp read as absent.
pub async fn get_latest_fresh(
    pool: &PgPool,
    asset_id: &str,
    as_of: DateTime<Utc>,
    staleness_secs: i64,
) -> anyhow::Result<Option<SentimentScore>> {
    let cutoff = as_of - Duration::seconds(staleness_secs);
    let score = sqlx::query_as::<_, SentimentScore>(
        r#"
        SELECT * FROM sentiment_scores
        WHERE asset_id = $1 AND analyzed_at >= $2 AND analyzed_at <= $3
        ORDER BY analyzed_at DESC
        LIMIT 1
        "#,
    )
    .bind(asset_id)
    .bind(cutoff)
    .bind(as_of)
    .fetch_optional(pool)
    .await?;

    Ok(score)
}

/// Instants where crowd sentiment crossed into an extreme, used as the
/// reference timeline for whale reaction latency.
pub async fn get_spike_timeline(
    pool: &PgPool,
    asset_id: &str,
    fear_threshold: Decimal,
    greed_threshold: Decimal,
) -> anyhow::Result<Vec<DateTime<Utc>>> {
    let rows: Vec<(DateTime<Utc>,)> = sqlx::query_as(
        r#"
        SELECT analyzed_at FROM sentiment_scores
        WHERE asset_id = $1 AND (score <= $2 OR score >= $3)
        ORDER BY analyzed_at
        "#,
    )
    .bind(asset_id)
    .bind(fear_threshold)
    .bind(greed_threshold)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(at,)| at).collect())
}
