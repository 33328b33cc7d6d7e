use sqlx::PgPool;

use crate::models::IntentDivergenceLog;

/// Append one evaluation's divergence row. The log is the audit trail;
/// (asset_id, evaluated_at) is the natural key so a retried write is a
/// no-op.
pub async fn insert_log(pool: &PgPool, log: &IntentDivergenceLog) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO intent_divergence_logs
            (id, asset_id, evaluated_at, sentiment_score, crowd_action, whale_score,
             whale_net_flow, divergence_type, intent_score, dominant_whale_behavior,
             active_whale_count, insight)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (asset_id, evaluated_at) DO NOTHING
        "#,
    )
    .bind(log.id)
    .bind(&log.asset_id)
    .bind(log.evaluated_at)
    .bind(log.sentiment_score)
    .bind(log.crowd_action.as_deref())
    .bind(log.whale_score)
    .bind(log.whale_net_flow)
    .bind(&log.divergence_type)
    .bind(log.intent_score)
    .bind(log.dominant_whale_behavior.as_deref())
    .bind(log.active_whale_count)
    .bind(log.insight.as_deref())
    .execute(pool)
    .await?;

    Ok(())
}

/// The most recent divergence state for an asset.
pub async fn get_latest(
    pool: &PgPool,
    asset_id: &str,
) -> anyhow::Result<Option<IntentDivergenceLog>> {
    let log = sqlx::query_as::<_, IntentDivergenceLog>(
        r#"
        SELECT * FROM intent_divergence_logs
        WHERE asset_id = $1
        ORDER BY evaluated_at DESC
        LIMIT 1
        "#,
    )
    .bind(asset_id)
    .fetch_optional(pool)
    .await?;

    Ok(log)
}
