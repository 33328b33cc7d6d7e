use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Record a news event from the upstream scraper. Keyed by
/// (asset_id, published_at); retries are no-ops.
pub async fn record_event(
    pool: &PgPool,
    asset_id: &str,
    category: Option<&str>,
    published_at: DateTime<Utc>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO news_events (asset_id, category, published_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (asset_id, published_at) DO NOTHING
        "#,
    )
    .bind(asset_id)
    .bind(category)
    .bind(published_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// News timestamps for an asset since `since`, used by the profiler to
/// count trades placed 1-2h ahead of a headline.
pub async fn get_timeline(
    pool: &PgPool,
    asset_id: &str,
    since: DateTime<Utc>,
) -> anyhow::Result<Vec<DateTime<Utc>>> {
    let rows: Vec<(DateTime<Utc>,)> = sqlx::query_as(
        r#"
        SELECT published_at FROM news_events
        WHERE asset_id = $1 AND published_at >= $2
        ORDER BY published_at
        "#,
    )
    .bind(asset_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(at,)| at).collect())
}
