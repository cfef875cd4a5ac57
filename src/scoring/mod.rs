pub mod pipeline;
pub mod weighted;

pub use pipeline::{rescore_with_analysis, score_batch, sort_by_score};
pub use weighted::{round3, AnalysisWeights, FactorScores, ScoringWeights, WeightedScorer};
