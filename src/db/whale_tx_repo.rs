use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::WhaleTransaction;

/// Append one classified whale transaction with its captured market
/// context. Outcome columns start null (unresolved).
pub async fn insert_transaction(
    pool: &PgPool,
    tx: &WhaleTransaction,
) -> anyhow::Result<WhaleTransaction> {
    let inserted = sqlx::query_as::<_, WhaleTransaction>(
        r#"
        INSERT INTO whale_transactions
            (id, address, chain, asset_id, direction, usd_value,
             price_at_tx, change_24h_at_tx, rsi_at_tx, sentiment_at_tx, executed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(tx.id)
    .bind(&tx.address)
    .bind(tx.chain.as_deref())
    .bind(&tx.asset_id)
    .bind(&tx.direction)
    .bind(tx.usd_value)
    .bind(tx.price_at_tx)
    .bind(tx.change_24h_at_tx)
    .bind(tx.rsi_at_tx)
    .bind(tx.sentiment_at_tx)
    .bind(tx.executed_at)
    .fetch_one(pool)
    .await?;

    Ok(inserted)
}

/// Transactions executed at or before the cutoff whose outcome is still
/// unfilled. The caller passes now minus the full outcome window.
pub async fn get_unresolved_before(
    pool: &PgPool,
    executed_before: DateTime<Utc>,
) -> anyhow::Result<Vec<WhaleTransaction>> {
    let txs = sqlx::query_as::<_, WhaleTransaction>(
        r#"
        SELECT * FROM whale_transactions
        WHERE resolved_at IS NULL AND executed_at <= $1
        ORDER BY address, executed_at
        "#,
    )
    .bind(executed_before)
    .fetch_all(pool)
    .await?;

    Ok(txs)
}

/// Second phase of the two-phase write: fill outcome fields exactly
/// once. The `resolved_at IS NULL` guard makes a replay a no-op, so a
/// resolved transaction is never edited again.
pub async fn resolve_transaction(
    pool: &PgPool,
    id: Uuid,
    price_after_24h: Option<Decimal>,
    price_after_7d: Option<Decimal>,
    profit_pct: Decimal,
    resolved_at: DateTime<Utc>,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE whale_transactions
        SET price_after_24h = $2,
            price_after_7d = $3,
            profit_pct = $4,
            resolved_at = $5
        WHERE id = $1 AND resolved_at IS NULL
        "#,
    )
    .bind(id)
    .bind(price_after_24h)
    .bind(price_after_7d)
    .bind(profit_pct)
    .bind(resolved_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Full history for one address, oldest first, for profile recompute.
pub async fn get_by_address(
    pool: &PgPool,
    address: &str,
) -> anyhow::Result<Vec<WhaleTransaction>> {
    let txs = sqlx::query_as::<_, WhaleTransaction>(
        "SELECT * FROM whale_transactions WHERE address = $1 ORDER BY executed_at",
    )
    .bind(address)
    .fetch_all(pool)
    .await?;

    Ok(txs)
}

/// Addresses that traded this asset inside the activity window, for the
/// divergence detector's corroboration count.
pub async fn get_active_addresses(
    pool: &PgPool,
    asset_id: &str,
    since: DateTime<Utc>,
) -> anyhow::Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT DISTINCT address FROM whale_transactions
        WHERE asset_id = $1 AND executed_at >= $2
        "#,
    )
    .bind(asset_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(a,)| a).collect())
}
