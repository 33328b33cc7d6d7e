pub mod asset_repo;
pub mod divergence_repo;
pub mod golden_repo;
pub mod news_repo;
pub mod onchain_repo;
pub mod profile_repo;
pub mod sentiment_repo;
pub mod technical_repo;
pub mod whale_tx_repo;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub async fn init_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    // Verify connectivity
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}
