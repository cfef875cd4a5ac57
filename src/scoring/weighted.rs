use serde::{Deserialize, Serialize};

use crate::product::{CompetitionLevel, ProductCandidate, DEFAULT_NICHE_SCORE};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub orders: f64,
    pub rating: f64,
    pub price_advantage: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            orders: 0.5,
            rating: 0.3,
            price_advantage: 0.2,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.orders + self.rating + self.price_advantage
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisWeights {
    pub orders: f64,
    pub rating: f64,
    pub price_advantage: f64,
    pub competition: f64,
    pub niche: f64,
}

impl Default for AnalysisWeights {
    fn default() -> Self {
        Self {
            orders: 0.30,
            rating: 0.20,
            price_advantage: 0.15,
            competition: 0.20,
            niche: 0.15,
        }
    }
}

impl AnalysisWeights {
    pub fn sum(&self) -> f64 {
        self.orders + self.rating + self.price_advantage + self.competition + self.niche
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorScores {
    pub order_score: f64,
    pub rating_score: f64,
    pub price_advantage: f64,
}

impl FactorScores {
    pub fn compute(candidate: &ProductCandidate, max_orders: u64, max_price: f64) -> Self {
        let max_orders = max_orders.max(1) as f64;
        let price_advantage = if max_price > 0.0 {
            1.0 - candidate.price / max_price
        } else {
            0.0
        };
        Self {
            order_score: candidate.orders as f64 / max_orders,
            rating_score: candidate.rating / 5.0,
            price_advantage,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeightedScorer {
    weights: ScoringWeights,
    analysis_weights: AnalysisWeights,
    max_price: f64,
}

impl WeightedScorer {
    pub fn new(weights: ScoringWeights, analysis_weights: AnalysisWeights, max_price: f64) -> Self {
        Self {
            weights,
            analysis_weights,
            max_price,
        }
    }

    pub fn max_price(&self) -> f64 {
        self.max_price
    }

    pub fn factors(&self, candidate: &ProductCandidate, max_orders: u64) -> FactorScores {
        FactorScores::compute(candidate, max_orders, self.max_price)
    }

    pub fn base_score(&self, factors: &FactorScores) -> f64 {
        let score = factors.order_score * self.weights.orders
            + factors.rating_score * self.weights.rating
            + factors.price_advantage * self.weights.price_advantage;
        round3(score)
    }

    pub fn analyzed_score(
        &self,
        factors: &FactorScores,
        competition: CompetitionLevel,
        niche_score: Option<u8>,
    ) -> f64 {
        let weights = &self.analysis_weights;
        let niche_norm = f64::from(niche_score.unwrap_or(DEFAULT_NICHE_SCORE)) / 10.0;
        let score = factors.order_score * weights.orders
            + factors.rating_score * weights.rating
            + factors.price_advantage * weights.price_advantage
            + competition_score(competition) * weights.competition
            + niche_norm * weights.niche;
        round3(score)
    }
}

pub fn competition_score(level: CompetitionLevel) -> f64 {
    match level {
        CompetitionLevel::Low => 1.0,
        CompetitionLevel::Medium => 0.5,
        CompetitionLevel::High | CompetitionLevel::Unknown => 0.15,
    }
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
