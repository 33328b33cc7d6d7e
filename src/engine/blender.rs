use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::technical::LabelBreakpoints;
use crate::models::{DataStatus, Horizon, SignalLabel, Timeframe};

/// Technical scores per timeframe for one asset, nulls where the
/// aggregator reported insufficient data (or the row was stale).
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeframeScores {
    pub h1: Option<Decimal>,
    pub h4: Option<Decimal>,
    pub d1: Option<Decimal>,
    pub w1: Option<Decimal>,
    pub mo1: Option<Decimal>,
}

impl TimeframeScores {
    pub fn get(&self, tf: Timeframe) -> Option<Decimal> {
        match tf {
            Timeframe::H1 => self.h1,
            Timeframe::H4 => self.h4,
            Timeframe::D1 => self.d1,
            Timeframe::W1 => self.w1,
            Timeframe::Mo1 => self.mo1,
        }
    }

    pub fn set(&mut self, tf: Timeframe, score: Option<Decimal>) {
        match tf {
            Timeframe::H1 => self.h1 = score,
            Timeframe::H4 => self.h4 = score,
            Timeframe::D1 => self.d1 = score,
            Timeframe::W1 => self.w1 = score,
            Timeframe::Mo1 => self.mo1 = score,
        }
    }
}

/// Component weights for the combined blend. Renormalized over the
/// non-null components at blend time; never defaulted to neutral.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendWeights {
    pub technical: Decimal,
    pub sentiment: Decimal,
    pub onchain: Decimal,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            technical: Decimal::new(60, 2),
            sentiment: Decimal::new(25, 2),
            onchain: Decimal::new(15, 2),
        }
    }
}

/// OK/INSUFFICIENT per horizon plus the combined score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonStatus {
    pub short: DataStatus,
    pub medium: DataStatus,
    pub long: DataStatus,
    pub combined: DataStatus,
}

/// Multi-horizon ASI output for one asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsiScores {
    pub asi_short: Option<Decimal>,
    pub asi_medium: Option<Decimal>,
    pub asi_long: Option<Decimal>,
    pub asi_combined: Option<Decimal>,
    pub signal_short: Option<SignalLabel>,
    pub signal_medium: Option<SignalLabel>,
    pub signal_long: Option<SignalLabel>,
    pub signal_combined: Option<SignalLabel>,
    pub data_status: HorizonStatus,
}

/// Blend timeframe technical scores plus sentiment and on-chain into
/// the multi-horizon ASI.
///
/// Horizons: short = 1h; medium = mean(4h, 1d); long = mean(1w, 1M),
/// each over whichever members are non-null. The combined score blends
/// the technical aggregate (mean of non-null horizon scores) with
/// sentiment and on-chain using `weights`, renormalizing the weights
/// over the components that are present. All-null inputs produce a null
/// combined score flagged INSUFFICIENT, never a default 50.
pub fn blend(
    timeframes: &TimeframeScores,
    sentiment: Option<Decimal>,
    onchain: Option<Decimal>,
    weights: &BlendWeights,
    breakpoints: &LabelBreakpoints,
) -> AsiScores {
    let asi_short = horizon_mean(timeframes, Horizon::Short);
    let asi_medium = horizon_mean(timeframes, Horizon::Medium);
    let asi_long = horizon_mean(timeframes, Horizon::Long);

    let tech = mean_of(&[asi_short, asi_medium, asi_long]);

    let asi_combined = weighted_blend(
        &[
            (tech, weights.technical),
            (sentiment, weights.sentiment),
            (onchain, weights.onchain),
        ],
    );

    AsiScores {
        signal_short: asi_short.map(|s| breakpoints.label_for(s)),
        signal_medium: asi_medium.map(|s| breakpoints.label_for(s)),
        signal_long: asi_long.map(|s| breakpoints.label_for(s)),
        signal_combined: asi_combined.map(|s| breakpoints.label_for(s)),
        data_status: HorizonStatus {
            short: status_of(asi_short),
            medium: status_of(asi_medium),
            long: status_of(asi_long),
            combined: status_of(asi_combined),
        },
        asi_short,
        asi_medium,
        asi_long,
        asi_combined,
    }
}

fn horizon_mean(timeframes: &TimeframeScores, horizon: Horizon) -> Option<Decimal> {
    let members: Vec<Option<Decimal>> = horizon
        .timeframes()
        .iter()
        .map(|tf| timeframes.get(*tf))
        .collect();
    mean_of(&members)
}

fn status_of(score: Option<Decimal>) -> DataStatus {
    match score {
        Some(_) => DataStatus::Ok,
        None => DataStatus::Insufficient,
    }
}

/// Mean over the non-null members; `None` when every member is null.
fn mean_of(values: &[Option<Decimal>]) -> Option<Decimal> {
    let present: Vec<Decimal> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    let sum: Decimal = present.iter().copied().sum();
    Some(sum / Decimal::from(present.len() as i64))
}

/// Weighted blend over non-null components with the weights renormalized
/// to sum to 1 over what is present. Defaulting a missing component to 50
/// would bias the blend toward neutral, which is exactly the silent-bug
/// class this function exists to prevent.
fn weighted_blend(components: &[(Option<Decimal>, Decimal)]) -> Option<Decimal> {
    let present: Vec<(Decimal, Decimal)> = components
        .iter()
        .filter_map(|(v, w)| v.map(|v| (v, *w)))
        .collect();

    let weight_sum: Decimal = present.iter().map(|(_, w)| *w).sum();
    if weight_sum.is_zero() {
        return None;
    }

    let blended: Decimal = present.iter().map(|(v, w)| *v * *w).sum::<Decimal>() / weight_sum;
    Some(blended)
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

    #[test]
    fn test_scenario_a_exact_blend() {
        // 1h:80, 4h:75, rest null; sentiment 65, onchain 55.
        let tf = TimeframeScores {
            h1: Some(dec(80)),
            h4: Some(dec(75)),
            ..Default::default()
        };
        let out = blend(
            &tf,
            Some(dec(65)),
            Some(dec(55)),
            &BlendWeights::default(),
            &LabelBreakpoints::asi(),
        );

        assert_eq!(out.asi_short, Some(dec(80)));
        assert_eq!(out.asi_medium, Some(dec(75)));
        assert_eq!(out.asi_long, None);
        // tech = avg(80, 75) = 77.5; combined = 77.5*0.6 + 65*0.25 + 55*0.15 = 71.0
        assert_eq!(out.asi_combined, Some(Decimal::new(710, 1)));
        assert_eq!(out.signal_combined, Some(crate::models::SignalLabel::Buy));
        assert_eq!(out.data_status.long, DataStatus::Insufficient);
        assert_eq!(out.data_status.combined, DataStatus::Ok);
    }

    #[test]
    fn test_all_null_yields_null_combined() {
        let out = blend(
            &TimeframeScores::default(),
            None,
            None,
            &BlendWeights::default(),
            &LabelBreakpoints::default(),
        );
        assert_eq!(out.asi_combined, None);
        assert_eq!(out.signal_combined, None);
        assert_eq!(out.data_status.combined, DataStatus::Insufficient);
        assert_eq!(out.data_status.short, DataStatus::Insufficient);
    }

    #[test]
    fn test_null_onchain_renormalizes_exactly() {
        // combined = tech*0.60/0.85 + sentiment*0.25/0.85
        let tf = TimeframeScores {
            h1: Some(dec(80)),
            ..Default::default()
        };
        let out = blend(
            &tf,
            Some(dec(40)),
            None,
            &BlendWeights::default(),
            &LabelBreakpoints::default(),
        );

        let expected = (dec(80) * Decimal::new(60, 2) + dec(40) * Decimal::new(25, 2))
            / Decimal::new(85, 2);
        assert_eq!(out.asi_combined, Some(expected));
    }

    #[test]
    fn test_renormalization_over_random_null_masks() {
        // Property: for every non-empty null-mask, the blend equals the
        // hand-renormalized formula and stays inside [0, 100].
        let weights = BlendWeights::default();
        let breakpoints = LabelBreakpoints::default();
        let tech_score = dec(90);
        let sent_score = dec(10);
        let chain_score = dec(50);

        for mask in 0u8..8 {
            let tech = (mask & 1 != 0).then_some(tech_score);
            let sentiment = (mask & 2 != 0).then_some(sent_score);
            let onchain = (mask & 4 != 0).then_some(chain_score);

            let tf = TimeframeScores {
                h1: tech,
                ..Default::default()
            };
            let out = blend(&tf, sentiment, onchain, &weights, &breakpoints);

            let mut num = Decimal::ZERO;
            let mut den = Decimal::ZERO;
            if let Some(t) = tech {
                num += t * weights.technical;
                den += weights.technical;
            }
            if let Some(s) = sentiment {
                num += s * weights.sentiment;
                den += weights.sentiment;
            }
            if let Some(o) = onchain {
                num += o * weights.onchain;
                den += weights.onchain;
            }

            if den.is_zero() {
                assert_eq!(out.asi_combined, None, "mask {mask}");
                assert_eq!(out.data_status.combined, DataStatus::Insufficient);
            } else {
                let expected = num / den;
                assert_eq!(out.asi_combined, Some(expected), "mask {mask}");
                assert!(expected >= Decimal::ZERO && expected <= dec(100));
            }
        }
    }

    #[test]
    fn test_medium_horizon_uses_available_member() {
        let tf = TimeframeScores {
            h4: Some(dec(64)),
            ..Default::default()
        };
        let out = blend(
            &tf,
            None,
            None,
            &BlendWeights::default(),
            &LabelBreakpoints::default(),
        );
        // 1d missing: medium is just the 4h score, not an average with a default.
        assert_eq!(out.asi_medium, Some(dec(64)));
        assert_eq!(out.signal_medium, Some(crate::models::SignalLabel::Buy));
    }
}
