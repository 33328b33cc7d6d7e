use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::OnchainScore;

/// Upsert the on-chain signal row for one asset (one logical row per
/// asset, updated in place).
#[allow(clippy::too_many_arguments)]
pub async fn upsert_score(
    pool: &PgPool,
    asset_id: &str,
    whale_signal: Option<&str>,
    whale_inflow: Option<Decimal>,
    whale_outflow: Option<Decimal>,
    dau_trend: Option<&str>,
    holder_accumulation: Option<Decimal>,
    overall_signal: Option<&str>,
    bullish_probability: Option<Decimal>,
    updated_at: DateTime<Utc>,
) -> anyhow::Result<()> {
    // Net flow is derived once here so every reader sees the same sign
    // convention: positive = exchange-bound = bearish.
    let net_flow = match (whale_inflow, whale_outflow) {
        (Some(inflow), Some(outflow)) => Some(inflow - outflow),
        _ => None,
    };

    sqlx::query(
        r#"
        INSERT INTO onchain_signals
            (asset_id, whale_signal, whale_net_flow, whale_inflow, whale_outflow,
             dau_trend, holder_accumulation, overall_signal, bullish_probability, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (asset_id) DO UPDATE SET
            whale_signal = EXCLUDED.whale_signal,
            whale_net_flow = EXCLUDED.whale_net_flow,
            whale_inflow = EXCLUDED.whale_inflow,
            whale_outflow = EXCLUDED.whale_outflow,
            dau_trend = EXCLUDED.dau_trend,
            holder_accumulation = EXCLUDED.holder_accumulation,
            overall_signal = EXCLUDED.overall_signal,
            bullish_probability = EXCLUDED.bullish_probability,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(asset_id)
    .bind(whale_signal)
    .bind(net_flow)
    .bind(whale_inflow)
    .bind(whale_outflow)
    .bind(dau_trend)
    .bind(holder_accumulation)
    .bind(overall_signal)
    .bind(bullish_probability)
    .bind(updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// The on-chain row for an asset if it exists and is fresh as of the
/// pass timestamp. A brand-new asset with no row reads as insufficient
/// data, not neutral.
pub async fn get_fresh(
    pool: &PgPool,
    asset_id: &str,
    as_of: DateTime<Utc>,
    staleness_secs: i64,
) -> anyhow::Result<Option<OnchainScore>> {
    let cutoff = as_of - Duration::seconds(staleness_secs);
    let score = sqlx::query_as::<_, OnchainScore>(
        r#"
        SELECT * FROM onchain_signals
        WHERE asset_id = $1 AND updated_at >= $2 AND updated_at <= $3
        "#,
    )
    .bind(asset_id)
    .bind(cutoff)
    .bind(as_of)
    .fetch_optional(pool)
    .await?;

    Ok(score)
}
