pub mod blender;
pub mod divergence;
pub mod golden;
pub mod profiler;
pub mod technical;

pub use blender::{blend, AsiScores, BlendWeights, HorizonStatus, TimeframeScores};
pub use divergence::{classify, intent_score, DivergenceConfig, DivergenceRead};
pub use golden::{build_signal, resolve_outcome, should_suppress, GoldenConfig, PriceTargets};
pub use profiler::{build_profile, ProfilerConfig};
pub use technical::{aggregate, IndicatorInputs, LabelBreakpoints, VoteWeights};
