use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    PatternDirection, PatternReliability, RsiDivergence, SignalLabel, TrendLabel,
};

/// Raw indicator readings for one (asset, timeframe) pair, as delivered
/// by the upstream indicator pipeline.
#[derive(Debug, Clone, Default)]
pub struct IndicatorInputs {
    /// Number of candles available for the timeframe. Below the
    /// configured minimum the aggregator refuses to score at all.
    pub candle_count: usize,
    pub rsi: Option<Decimal>,
    pub macd_histogram: Option<Decimal>,
    /// True when the MACD line crossed its signal line this cycle, in the
    /// direction of the histogram.
    pub macd_signal_cross: Option<bool>,
    /// Bollinger %B: 0 at the lower band, 1 at the upper band.
    pub bollinger_percent_b: Option<Decimal>,
    pub bollinger_squeeze: Option<bool>,
    pub trend: Option<TrendLabel>,
    pub pattern_name: Option<String>,
    pub pattern_direction: Option<PatternDirection>,
    pub pattern_reliability: Option<PatternReliability>,
    pub rsi_divergence: Option<RsiDivergence>,
}

/// Fixed vote-weight table. Values are tunable via config, not learned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteWeights {
    pub rsi: Decimal,
    pub macd: Decimal,
    pub bollinger: Decimal,
    pub trend: Decimal,
    pub pattern_weak: Decimal,
    pub pattern_medium: Decimal,
    pub pattern_high: Decimal,
    pub divergence: Decimal,
    /// Minimum candles required before any score is emitted.
    pub min_candles: usize,
}

impl Default for VoteWeights {
    fn default() -> Self {
        Self {
            rsi: Decimal::ONE,
            macd: Decimal::ONE,
            bollinger: Decimal::new(75, 2),
            trend: Decimal::new(50, 2),
            pattern_weak: Decimal::new(50, 2),
            pattern_medium: Decimal::ONE,
            pattern_high: Decimal::new(150, 2),
            divergence: Decimal::new(175, 2),
            min_candles: 30,
        }
    }
}

/// Score breakpoints for the five-way signal label. A configuration
/// table, not business logic, so it can be tuned without code changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelBreakpoints {
    pub strong_buy: Decimal,
    pub buy: Decimal,
    pub sell: Decimal,
    pub strong_sell: Decimal,
}

impl Default for LabelBreakpoints {
    fn default() -> Self {
        Self {
            strong_buy: Decimal::from(70),
            buy: Decimal::from(60),
            sell: Decimal::from(40),
            strong_sell: Decimal::from(30),
        }
    }
}

impl LabelBreakpoints {
    /// Wider table used for blended ASI labels: a composite score is
    /// diluted by averaging, so the extreme labels need more headroom
    /// than a single-timeframe technical score.
    pub fn asi() -> Self {
        Self {
            strong_buy: Decimal::from(80),
            buy: Decimal::from(60),
            sell: Decimal::from(40),
            strong_sell: Decimal::from(20),
        }
    }

    pub fn label_for(&self, score: Decimal) -> SignalLabel {
        if score >= self.strong_buy {
            SignalLabel::StrongBuy
        } else if score >= self.buy {
            SignalLabel::Buy
        } else if score <= self.strong_sell {
            SignalLabel::StrongSell
        } else if score <= self.sell {
            SignalLabel::Sell
        } else {
            SignalLabel::Hold
        }
    }
}

/// Aggregate one timeframe's indicator readings into a 0-100 score and
/// a signal label.
///
/// Each present indicator casts a signed vote in [-1, 1] scaled by its
/// weight; the weighted sum is mapped linearly into [0, 100] and then
/// thresholded through the breakpoint table.
///
/// Returns `None` when fewer than `min_candles` candles exist or no
/// indicator produced a reading. A fabricated neutral 50 is never
/// emitted for missing data.
pub fn aggregate(
    inputs: &IndicatorInputs,
    weights: &VoteWeights,
    breakpoints: &LabelBreakpoints,
) -> Option<(Decimal, SignalLabel)> {
    if inputs.candle_count < weights.min_candles {
        return None;
    }

    let mut weighted_sum = Decimal::ZERO;
    let mut total_weight = Decimal::ZERO;

    // RSI overbought/oversold. An RSI divergence supersedes the plain
    // reading: a bullish divergence at RSI 75 is not a sell.
    if let Some(div) = inputs.rsi_divergence {
        let vote = match div {
            RsiDivergence::Bullish => Decimal::ONE,
            RsiDivergence::Bearish => -Decimal::ONE,
        };
        weighted_sum += vote * weights.divergence;
        total_weight += weights.divergence;
    } else if let Some(rsi) = inputs.rsi {
        let vote = rsi_vote(rsi);
        weighted_sum += vote * weights.rsi;
        total_weight += weights.rsi;
    }

    // MACD: histogram sign gives direction, a fresh signal-line cross
    // doubles conviction.
    if let Some(hist) = inputs.macd_histogram {
        let base = if hist > Decimal::ZERO {
            Decimal::new(50, 2)
        } else if hist < Decimal::ZERO {
            Decimal::new(-50, 2)
        } else {
            Decimal::ZERO
        };
        let vote = if inputs.macd_signal_cross == Some(true) {
            base * Decimal::from(2)
        } else {
            base
        };
        weighted_sum += vote * weights.macd;
        total_weight += weights.macd;
    }

    // Bollinger %B, mean-reversion read. A squeeze carries no direction
    // and abstains rather than voting neutral.
    if inputs.bollinger_squeeze != Some(true) {
        if let Some(pb) = inputs.bollinger_percent_b {
            let vote = bollinger_vote(pb);
            weighted_sum += vote * weights.bollinger;
            total_weight += weights.bollinger;
        }
    }

    if let Some(trend) = inputs.trend {
        let vote = match trend {
            TrendLabel::Up => Decimal::ONE,
            TrendLabel::Down => -Decimal::ONE,
            TrendLabel::Sideways => Decimal::ZERO,
        };
        weighted_sum += vote * weights.trend;
        total_weight += weights.trend;
    }

    if let (Some(direction), Some(reliability)) =
        (inputs.pattern_direction, inputs.pattern_reliability)
    {
        let weight = match reliability {
            PatternReliability::Weak => weights.pattern_weak,
            PatternReliability::Medium => weights.pattern_medium,
            PatternReliability::High => weights.pattern_high,
        };
        let vote = match direction {
            PatternDirection::Bullish => Decimal::ONE,
            PatternDirection::Bearish => -Decimal::ONE,
        };
        weighted_sum += vote * weight;
        total_weight += weight;
    }

    if total_weight.is_zero() {
        return None;
    }

    // Linear map: weighted_sum/total_weight in [-1, 1] -> [0, 100].
    let normalized = weighted_sum / total_weight;
    let fifty = Decimal::from(50);
    let score = (fifty + normalized * fifty)
        .max(Decimal::ZERO)
        .min(Decimal::from(100));

    let label = breakpoints.label_for(score);
    Some((score, label))
}

fn rsi_vote(rsi: Decimal) -> Decimal {
    if rsi < Decimal::from(30) {
        Decimal::ONE
    } else if rsi < Decimal::from(40) {
        Decimal::new(50, 2)
    } else if rsi > Decimal::from(70) {
        -Decimal::ONE
    } else if rsi > Decimal::from(60) {
        Decimal::new(-50, 2)
    } else {
        Decimal::ZERO
    }
}

fn bollinger_vote(percent_b: Decimal) -> Decimal {
    if percent_b <= Decimal::ZERO {
        Decimal::ONE
    } else if percent_b < Decimal::new(20, 2) {
        Decimal::new(50, 2)
    } else if percent_b >= Decimal::ONE {
        -Decimal::ONE
    } else if percent_b > Decimal::new(80, 2) {
        Decimal::new(-50, 2)
    } else {
        Decimal::ZERO
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs_with_candles(candle_count: usize) -> IndicatorInputs {
        IndicatorInputs {
            candle_count,
            ..Default::default()
        }
    }

    #[test]
    fn test_insufficient_candles_returns_none() {
        let mut inputs = inputs_with_candles(10);
        inputs.rsi = Some(Decimal::from(25));
        assert_eq!(
            aggregate(&inputs, &VoteWeights::default(), &LabelBreakpoints::default()),
            None,
            "must not fabricate a score below the candle minimum"
        );
    }

    #[test]
    fn test_no_indicators_returns_none() {
        let inputs = inputs_with_candles(100);
        assert_eq!(
            aggregate(&inputs, &VoteWeights::default(), &LabelBreakpoints::default()),
            None
        );
    }

    #[test]
    fn test_oversold_rsi_scores_bullish() {
        let mut inputs = inputs_with_candles(100);
        inputs.rsi = Some(Decimal::from(22));
        let (score, label) =
            aggregate(&inputs, &VoteWeights::default(), &LabelBreakpoints::default()).unwrap();
        assert_eq!(score, Decimal::from(100));
        assert_eq!(label, SignalLabel::StrongBuy);
    }

    #[test]
    fn test_bearish_divergence_overrides_oversold_rsi() {
        let mut inputs = inputs_with_candles(100);
        inputs.rsi = Some(Decimal::from(22)); // would vote bullish on its own
        inputs.rsi_divergence = Some(RsiDivergence::Bearish);
        let (score, label) =
            aggregate(&inputs, &VoteWeights::default(), &LabelBreakpoints::default()).unwrap();
        assert!(score < Decimal::from(50), "divergence must win: {score}");
        assert_eq!(label, SignalLabel::StrongSell);
    }

    #[test]
    fn test_high_reliability_pattern_outweighs_weak() {
        let weights = VoteWeights::default();
        let breakpoints = LabelBreakpoints::default();

        let mut weak = inputs_with_candles(100);
        weak.rsi = Some(Decimal::from(75)); // bearish vote
        weak.pattern_direction = Some(PatternDirection::Bullish);
        weak.pattern_reliability = Some(PatternReliability::Weak);
        let (weak_score, _) = aggregate(&weak, &weights, &breakpoints).unwrap();

        let mut strong = inputs_with_candles(100);
        strong.rsi = Some(Decimal::from(75));
        strong.pattern_direction = Some(PatternDirection::Bullish);
        strong.pattern_reliability = Some(PatternReliability::High);
        let (strong_score, _) = aggregate(&strong, &weights, &breakpoints).unwrap();

        assert!(strong_score > weak_score);
    }

    #[test]
    fn test_squeeze_abstains_from_bollinger_vote() {
        let weights = VoteWeights::default();
        let breakpoints = LabelBreakpoints::default();

        let mut inputs = inputs_with_candles(100);
        inputs.bollinger_percent_b = Some(Decimal::new(105, 2)); // above upper band
        inputs.bollinger_squeeze = Some(true);
        // Only the squeeze-suppressed Bollinger was present, so nothing voted.
        assert_eq!(aggregate(&inputs, &weights, &breakpoints), None);
    }

    #[test]
    fn test_macd_cross_doubles_conviction() {
        let weights = VoteWeights::default();
        let breakpoints = LabelBreakpoints::default();

        let mut plain = inputs_with_candles(100);
        plain.macd_histogram = Some(Decimal::from(2));
        let (plain_score, _) = aggregate(&plain, &weights, &breakpoints).unwrap();

        let mut crossed = inputs_with_candles(100);
        crossed.macd_histogram = Some(Decimal::from(2));
        crossed.macd_signal_cross = Some(true);
        let (crossed_score, _) = aggregate(&crossed, &weights, &breakpoints).unwrap();

        assert!(crossed_score > plain_score);
    }

    #[test]
    fn test_score_always_in_range() {
        let weights = VoteWeights::default();
        let breakpoints = LabelBreakpoints::default();

        // Stack every bearish vote available.
        let mut inputs = inputs_with_candles(100);
        inputs.rsi = Some(Decimal::from(90));
        inputs.macd_histogram = Some(Decimal::from(-5));
        inputs.macd_signal_cross = Some(true);
        inputs.bollinger_percent_b = Some(Decimal::new(120, 2));
        inputs.trend = Some(TrendLabel::Down);
        inputs.pattern_direction = Some(PatternDirection::Bearish);
        inputs.pattern_reliability = Some(PatternReliability::High);
        inputs.rsi_divergence = Some(RsiDivergence::Bearish);

        let (score, label) = aggregate(&inputs, &weights, &breakpoints).unwrap();
        assert!(score >= Decimal::ZERO && score <= Decimal::from(100));
        assert_eq!(label, SignalLabel::StrongSell);
    }

    #[test]
    fn test_breakpoint_labels() {
        let bp = LabelBreakpoints::default();
        assert_eq!(bp.label_for(Decimal::from(85)), SignalLabel::StrongBuy);
        assert_eq!(bp.label_for(Decimal::from(70)), SignalLabel::StrongBuy);
        assert_eq!(bp.label_for(Decimal::from(65)), SignalLabel::Buy);
        assert_eq!(bp.label_for(Decimal::from(50)), SignalLabel::Hold);
        assert_eq!(bp.label_for(Decimal::from(35)), SignalLabel::Sell);
        assert_eq!(bp.label_for(Decimal::from(30)), SignalLabel::StrongSell);
        assert_eq!(bp.label_for(Decimal::from(5)), SignalLabel::StrongSell);
    }
}
