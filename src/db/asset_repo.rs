use sqlx::PgPool;

use crate::models::AssetSnapshot;

/// Refresh the snapshot for an asset. Keyed by asset_id; safe to retry.
pub async fn upsert_snapshot(pool: &PgPool, snapshot: &AssetSnapshot) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO asset_snapshots
            (asset_id, symbol, price, change_1h, change_24h, change_7d, volume_24h, market_cap, fetched_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (asset_id) DO UPDATE SET
            symbol = EXCLUDED.symbol,
            price = EXCLUDED.price,
            change_1h = EXCLUDED.change_1h,
            change_24h = EXCLUDED.change_24h,
            change_7d = EXCLUDED.change_7d,
            volume_24h = EXCLUDED.volume_24h,
            market_cap = EXCLUDED.market_cap,
            fetched_at = EXCLUDED.fetched_at
        "#,
    )
    .bind(&snapshot.asset_id)
    .bind(&snapshot.symbol)
    .bind(snapshot.price)
    .bind(snapshot.change_1h)
    .bind(snapshot.change_24h)
    .bind(snapshot.change_7d)
    .bind(snapshot.volume_24h)
    .bind(snapshot.market_cap)
    .bind(snapshot.fetched_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_snapshot(pool: &PgPool, asset_id: &str) -> anyhow::Result<Option<AssetSnapshot>> {
    let snapshot = sqlx::query_as::<_, AssetSnapshot>(
        "SELECT * FROM asset_snapshots WHERE asset_id = $1",
    )
    .bind(asset_id)
    .fetch_optional(pool)
    .await?;

    Ok(snapshot)
}

/// Every asset the engine currently tracks, for the scheduler fan-out.
pub async fn list_asset_ids(pool: &PgPool) -> anyhow::Result<Vec<String>> {
    let ids: Vec<(String,)> = sqlx::query_as(
        "SELECT asset_id FROM asset_snapshots ORDER BY asset_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(ids.into_iter().map(|(id,)| id).collect())
}
