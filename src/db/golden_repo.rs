use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{GoldenShadowSignal, SignalOutcome};

pub async fn insert_signal(pool: &PgPool, signal: &GoldenShadowSignal) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO golden_shadow_signals
            (id, asset_id, signal_timestamp, signal_type, intent_score, divergence_type,
             entry_price, stop_price, target_price, outcome, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (asset_id, signal_timestamp) DO NOTHING
        "#,
    )
    .bind(signal.id)
    .bind(&signal.asset_id)
    .bind(signal.signal_timestamp)
    .bind(&signal.signal_type)
    .bind(signal.intent_score)
    .bind(&signal.divergence_type)
    .bind(signal.entry_price)
    .bind(signal.stop_price)
    .bind(signal.target_price)
    .bind(&signal.outcome)
    .bind(signal.expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Recent signals for one asset, newest first, for the dedupe check.
pub async fn get_recent_for_asset(
    pool: &PgPool,
    asset_id: &str,
    since: DateTime<Utc>,
) -> anyhow::Result<Vec<GoldenShadowSignal>> {
    let signals = sqlx::query_as::<_, GoldenShadowSignal>(
        r#"
        SELECT * FROM golden_shadow_signals
        WHERE asset_id = $1 AND signal_timestamp >= $2
        ORDER BY signal_timestamp DESC
        "#,
    )
    .bind(asset_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(signals)
}

pub async fn list_pending(pool: &PgPool) -> anyhow::Result<Vec<GoldenShadowSignal>> {
    let signals = sqlx::query_as::<_, GoldenShadowSignal>(
        r#"
        SELECT * FROM golden_shadow_signals
        WHERE outcome = 'pending'
        ORDER BY signal_timestamp DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(signals)
}

pub async fn list_recent(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<GoldenShadowSignal>> {
    let signals = sqlx::query_as::<_, GoldenShadowSignal>(
        r#"
        SELECT * FROM golden_shadow_signals
        ORDER BY signal_timestamp DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(signals)
}

/// Record observed outcome prices and flip the lifecycle state. Only a
/// pending row can change; success/failure are terminal.
pub async fn update_outcome(
    pool: &PgPool,
    id: Uuid,
    outcome: SignalOutcome,
    actual_price_24h: Option<Decimal>,
    actual_price_7d: Option<Decimal>,
    resolved_at: DateTime<Utc>,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE golden_shadow_signals
        SET outcome = $2,
            actual_price_24h = COALESCE($3, actual_price_24h),
            actual_price_7d = COALESCE($4, actual_price_7d),
            resolved_at = $5
        WHERE id = $1 AND outcome = 'pending'
        "#,
    )
    .bind(id)
    .bind(outcome.as_str())
    .bind(actual_price_24h)
    .bind(actual_price_7d)
    .bind(resolved_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Record an observed price without resolving, keeping the signal
/// pending until the evaluation window closes.
pub async fn record_observed_prices(
    pool: &PgPool,
    id: Uuid,
    actual_price_24h: Option<Decimal>,
    actual_price_7d: Option<Decimal>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE golden_shadow_signals
        SET actual_price_24h = COALESCE($2, actual_price_24h),
            actual_price_7d = COALESCE($3, actual_price_7d)
        WHERE id = $1 AND outcome = 'pending'
        "#,
    )
    .bind(id)
    .bind(actual_price_24h)
    .bind(actual_price_7d)
    .execute(pool)
    .await?;

    Ok(())
}
