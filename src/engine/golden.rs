use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    DivergenceType, GoldenShadowSignal, GoldenSignalType, IntentDivergenceLog, SignalOutcome,
};

/// Promotion thresholds and price-band parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenConfig {
    /// Minimum intent score for promotion.
    pub intent_threshold: Decimal,
    /// No second signal for the same (asset, divergence type) while a
    /// pending one exists inside this window.
    pub cooldown_hours: i64,
    /// Pending signals expire after this long.
    pub expiry_hours: i64,
    /// Stop distance in ATR multiples.
    pub stop_atr_mult: Decimal,
    /// Target distance in ATR multiples.
    pub target_atr_mult: Decimal,
}

impl Default for GoldenConfig {
    fn default() -> Self {
        Self {
            intent_threshold: Decimal::from(80),
            cooldown_hours: 24,
            expiry_hours: 168,
            stop_atr_mult: Decimal::new(15, 1),
            target_atr_mult: Decimal::from(3),
        }
    }
}

/// Suggested entry/stop/target band around the current price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceTargets {
    pub entry: Decimal,
    pub stop: Decimal,
    pub target: Decimal,
}

/// ATR-band price targets. Kept as a free function so the band logic can
/// be swapped without touching promotion.
pub fn atr_price_targets(
    price: Decimal,
    atr: Decimal,
    signal_type: GoldenSignalType,
    cfg: &GoldenConfig,
) -> PriceTargets {
    match signal_type {
        GoldenSignalType::Entry => PriceTargets {
            entry: price,
            stop: price - atr * cfg.stop_atr_mult,
            target: price + atr * cfg.target_atr_mult,
        },
        // Exit warning: target below (expected drawdown), stop above
        // (the level that invalidates the warning).
        GoldenSignalType::Exit => PriceTargets {
            entry: price,
            stop: price + atr * cfg.stop_atr_mult,
            target: price - atr * cfg.target_atr_mult,
        },
    }
}

/// Promote a divergence log row into a golden-shadow signal, or `None`
/// when it does not clear the bar. Dedupe against existing pending
/// signals is the caller's job via [`should_suppress`].
pub fn build_signal(
    log: &IntentDivergenceLog,
    price: Decimal,
    atr: Decimal,
    cfg: &GoldenConfig,
    now: DateTime<Utc>,
) -> Option<GoldenShadowSignal> {
    let divergence = log.divergence_enum()?;
    if !divergence.is_actionable() || log.intent_score < cfg.intent_threshold {
        return None;
    }

    let signal_type = match divergence {
        DivergenceType::ShadowAccumulation => GoldenSignalType::Entry,
        DivergenceType::BullTrap => GoldenSignalType::Exit,
        DivergenceType::Confirmation | DivergenceType::Neutral => return None,
    };

    let targets = atr_price_targets(price, atr, signal_type, cfg);

    Some(GoldenShadowSignal {
        id: Uuid::new_v4(),
        asset_id: log.asset_id.clone(),
        signal_timestamp: now,
        signal_type: signal_type.as_str().to_string(),
        intent_score: log.intent_score,
        divergence_type: divergence.as_str().to_string(),
        entry_price: targets.entry,
        stop_price: targets.stop,
        target_price: targets.target,
        outcome: SignalOutcome::Pending.as_str().to_string(),
        actual_price_24h: None,
        actual_price_7d: None,
        expires_at: now + Duration::hours(cfg.expiry_hours),
        resolved_at: None,
    })
}

/// True when an unresolved pending signal for the same (asset,
/// divergence type) already exists inside the cooldown window, meaning
/// this cycle's still-firing divergence is the same underlying event.
pub fn should_suppress(
    existing: &[GoldenShadowSignal],
    asset_id: &str,
    divergence_type: DivergenceType,
    now: DateTime<Utc>,
    cfg: &GoldenConfig,
) -> bool {
    let window_start = now - Duration::hours(cfg.cooldown_hours);
    existing.iter().any(|s| {
        s.asset_id == asset_id
            && s.divergence_type == divergence_type.as_str()
            && s.is_pending()
            && s.signal_timestamp >= window_start
    })
}

/// Judge a pending signal once outcome prices are known or it has
/// expired. Returns `None` while there is nothing to judge yet.
///
/// The 7d price is authoritative when present; before expiry the 24h
/// price only resolves a signal when it has already crossed the target
/// or the stop.
pub fn resolve_outcome(
    signal: &GoldenShadowSignal,
    now: DateTime<Utc>,
) -> Option<SignalOutcome> {
    if !signal.is_pending() {
        return None;
    }
    let signal_type = signal.signal_type_enum()?;

    let favorable = |p: Decimal| match signal_type {
        GoldenSignalType::Entry => p >= signal.target_price,
        GoldenSignalType::Exit => p <= signal.target_price,
    };
    let stopped = |p: Decimal| match signal_type {
        GoldenSignalType::Entry => p <= signal.stop_price,
        GoldenSignalType::Exit => p >= signal.stop_price,
    };

    if let Some(p7) = signal.actual_price_7d {
        if favorable(p7) {
            return Some(SignalOutcome::Success);
        }
        if stopped(p7) {
            return Some(SignalOutcome::Failure);
        }
        // Window elapsed without reaching either band: score by the
        // direction actually realized.
        let moved_right = match signal_type {
            GoldenSignalType::Entry => p7 > signal.entry_price,
            GoldenSignalType::Exit => p7 < signal.entry_price,
        };
        return Some(if moved_right {
            SignalOutcome::Success
        } else {
            SignalOutcome::Failure
        });
    }

    if let Some(p24) = signal.actual_price_24h {
        if favorable(p24) {
            return Some(SignalOutcome::Success);
        }
        if stopped(p24) {
            return Some(SignalOutcome::Failure);
        }
    }

    if now >= signal.expires_at {
        // Expired with no decisive price observed.
        return Some(SignalOutcome::Failure);
    }

    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(v: i64) -> Decimal {
        Decimal::from(v)
    }

    fn make_log(divergence: DivergenceType, intent: i64) -> IntentDivergenceLog {
        IntentDivergenceLog {
            id: Uuid::new_v4(),
            asset_id: "bitcoin".into(),
            evaluated_at: Utc::now(),
            sentiment_score: Some(dec(25)),
            crowd_action: Some("panic_sell".into()),
            whale_score: Some(dec(70)),
            whale_net_flow: Some(dec(-500_000)),
            divergence_type: divergence.as_str().to_string(),
            intent_score: dec(intent),
            dominant_whale_behavior: Some("accumulator".into()),
            active_whale_count: 5,
            insight: None,
        }
    }

    #[test]
    fn test_promotes_shadow_accumulation_to_entry() {
        let log = make_log(DivergenceType::ShadowAccumulation, 85);
        let signal = build_signal(
            &log,
            dec(60_000),
            dec(1_000),
            &GoldenConfig::default(),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(signal.signal_type, "entry");
        assert_eq!(signal.entry_price, dec(60_000));
        assert_eq!(signal.stop_price, Decimal::new(58_500, 0));
        assert_eq!(signal.target_price, dec(63_000));
        assert_eq!(signal.outcome, "pending");
    }

    #[test]
    fn test_promotes_bull_trap_to_exit() {
        let log = make_log(DivergenceType::BullTrap, 90);
        let signal = build_signal(
            &log,
            dec(60_000),
            dec(1_000),
            &GoldenConfig::default(),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(signal.signal_type, "exit");
        assert!(signal.target_price < signal.entry_price);
        assert!(signal.stop_price > signal.entry_price);
    }

    #[test]
    fn test_below_threshold_not_promoted() {
        let log = make_log(DivergenceType::ShadowAccumulation, 79);
        assert!(build_signal(
            &log,
            dec(60_000),
            dec(1_000),
            &GoldenConfig::default(),
            Utc::now()
        )
        .is_none());
    }

    #[test]
    fn test_confirmation_never_promoted() {
        let log = make_log(DivergenceType::Confirmation, 99);
        assert!(build_signal(
            &log,
            dec(60_000),
            dec(1_000),
            &GoldenConfig::default(),
            Utc::now()
        )
        .is_none());
    }

    #[test]
    fn test_dedupe_suppresses_same_event_in_cooldown() {
        let cfg = GoldenConfig::default();
        let now = Utc::now();
        let log = make_log(DivergenceType::ShadowAccumulation, 85);
        let existing = build_signal(&log, dec(60_000), dec(1_000), &cfg, now).unwrap();

        assert!(should_suppress(
            &[existing.clone()],
            "bitcoin",
            DivergenceType::ShadowAccumulation,
            now + Duration::hours(2),
            &cfg,
        ));

        // Different divergence type is a different event.
        assert!(!should_suppress(
            &[existing.clone()],
            "bitcoin",
            DivergenceType::BullTrap,
            now + Duration::hours(2),
            &cfg,
        ));

        // Different asset is a different event.
        assert!(!should_suppress(
            &[existing.clone()],
            "ethereum",
            DivergenceType::ShadowAccumulation,
            now + Duration::hours(2),
            &cfg,
        ));

        // Outside the cooldown the suppression lapses.
        assert!(!should_suppress(
            &[existing.clone()],
            "bitcoin",
            DivergenceType::ShadowAccumulation,
            now + Duration::hours(25),
            &cfg,
        ));

        // A resolved signal no longer blocks.
        let mut resolved = existing;
        resolved.outcome = SignalOutcome::Success.as_str().to_string();
        assert!(!should_suppress(
            &[resolved],
            "bitcoin",
            DivergenceType::ShadowAccumulation,
            now + Duration::hours(2),
            &cfg,
        ));
    }

    #[test]
    fn test_entry_resolves_success_on_target_hit() {
        let cfg = GoldenConfig::default();
        let now = Utc::now();
        let log = make_log(DivergenceType::ShadowAccumulation, 85);
        let mut signal = build_signal(&log, dec(60_000), dec(1_000), &cfg, now).unwrap();

        signal.actual_price_24h = Some(dec(63_500)); // above target 63,000
        assert_eq!(resolve_outcome(&signal, now), Some(SignalOutcome::Success));
    }

    #[test]
    fn test_entry_resolves_failure_on_stop_hit() {
        let cfg = GoldenConfig::default();
        let now = Utc::now();
        let log = make_log(DivergenceType::ShadowAccumulation, 85);
        let mut signal = build_signal(&log, dec(60_000), dec(1_000), &cfg, now).unwrap();

        signal.actual_price_7d = Some(dec(58_000)); // below stop 58,500
        assert_eq!(resolve_outcome(&signal, now), Some(SignalOutcome::Failure));
    }

    #[test]
    fn test_inconclusive_24h_price_stays_pending() {
        let cfg = GoldenConfig::default();
        let now = Utc::now();
        let log = make_log(DivergenceType::ShadowAccumulation, 85);
        let mut signal = build_signal(&log, dec(60_000), dec(1_000), &cfg, now).unwrap();

        signal.actual_price_24h = Some(dec(60_500)); // between bands
        assert_eq!(resolve_outcome(&signal, now), None);
    }

    #[test]
    fn test_seven_day_price_resolves_by_direction() {
        let cfg = GoldenConfig::default();
        let now = Utc::now();
        let log = make_log(DivergenceType::ShadowAccumulation, 85);
        let mut signal = build_signal(&log, dec(60_000), dec(1_000), &cfg, now).unwrap();

        signal.actual_price_7d = Some(dec(61_000)); // up, but short of target
        assert_eq!(resolve_outcome(&signal, now), Some(SignalOutcome::Success));
    }

    #[test]
    fn test_expired_pending_signal_fails() {
        let cfg = GoldenConfig::default();
        let now = Utc::now();
        let log = make_log(DivergenceType::ShadowAccumulation, 85);
        let signal = build_signal(&log, dec(60_000), dec(1_000), &cfg, now).unwrap();

        let later = now + Duration::hours(cfg.expiry_hours + 1);
        assert_eq!(resolve_outcome(&signal, later), Some(SignalOutcome::Failure));
    }
}
