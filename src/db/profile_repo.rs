use sqlx::PgPool;

use crate::models::WhaleBehavioralProfile;

/// Upsert the behavioral profile for one address. Profiles are never
/// deleted, only replaced with a fresh recompute; the caller serializes
/// updates per address.
pub async fn upsert_profile(
    pool: &PgPool,
    profile: &WhaleBehavioralProfile,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO whale_behavioral_profiles
            (address, chain, behavior_label, behavior_confidence, success_rate,
             avg_reaction_latency_mins, trades_before_news, trades_during_fear,
             trades_during_greed, total_transactions, resolved_transactions, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (address) DO UPDATE SET
            chain = EXCLUDED.chain,
            behavior_label = EXCLUDED.behavior_label,
            behavior_confidence = EXCLUDED.behavior_confidence,
            success_rate = EXCLUDED.success_rate,
            avg_reaction_latency_mins = EXCLUDED.avg_reaction_latency_mins,
            trades_before_news = EXCLUDED.trades_before_news,
            trades_during_fear = EXCLUDED.trades_during_fear,
            trades_during_greed = EXCLUDED.trades_during_greed,
            total_transactions = EXCLUDED.total_transactions,
            resolved_transactions = EXCLUDED.resolved_transactions,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(&profile.address)
    .bind(profile.chain.as_deref())
    .bind(&profile.behavior_label)
    .bind(profile.behavior_confidence)
    .bind(profile.success_rate)
    .bind(profile.avg_reaction_latency_mins)
    .bind(profile.trades_before_news)
    .bind(profile.trades_during_fear)
    .bind(profile.trades_during_greed)
    .bind(profile.total_transactions)
    .bind(profile.resolved_transactions)
    .bind(profile.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Profiles for a set of addresses, best-established first.
pub async fn get_profiles(
    pool: &PgPool,
    addresses: &[String],
) -> anyhow::Result<Vec<WhaleBehavioralProfile>> {
    let profiles = sqlx::query_as::<_, WhaleBehavioralProfile>(
        r#"
        SELECT * FROM whale_behavioral_profiles
        WHERE address = ANY($1)
        ORDER BY behavior_confidence DESC
        "#,
    )
    .bind(addresses)
    .fetch_all(pool)
    .await?;

    Ok(profiles)
}
