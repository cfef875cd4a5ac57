use std::cmp::Ordering;

use crate::product::{ProductCandidate, ScoredProduct};
use crate::scoring::WeightedScorer;

pub fn score_batch(candidates: Vec<ProductCandidate>, scorer: &WeightedScorer) -> Vec<ScoredProduct> {
    let max_orders = batch_max_orders(candidates.iter());

    let mut scored: Vec<ScoredProduct> = candidates
        .into_iter()
        .map(|candidate| {
            let factors = scorer.factors(&candidate, max_orders);
            let score = scorer.base_score(&factors);
            ScoredProduct::new(candidate, score)
        })
        .collect();

    sort_by_score(&mut scored);
    scored
}

pub fn rescore_with_analysis(products: &mut [ScoredProduct], scorer: &WeightedScorer) {
    let max_orders = batch_max_orders(products.iter().map(|product| &product.candidate));

    for product in products.iter_mut() {
        let factors = scorer.factors(&product.candidate, max_orders);
        product.viral_score =
            scorer.analyzed_score(&factors, product.competition_level(), product.niche_score());
    }

    sort_by_score(products);
}

/// Descending by viral score. Stable: equal scores keep their input order.
pub fn sort_by_score(products: &mut [ScoredProduct]) {
    products.sort_by(|a, b| {
        b.viral_score
            .partial_cmp(&a.viral_score)
            .unwrap_or(Ordering::Equal)
    });
}

fn batch_max_orders<'a>(candidates: impl Iterator<Item = &'a ProductCandidate>) -> u64 {
    candidates.map(|candidate| candidate.orders).max().unwrap_or(0).max(1)
}
