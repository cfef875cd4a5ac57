use serde_json::json;
use viral_hunter::filter::{filter_candidates, FilterThresholds};
use viral_hunter::product::{normalize_batch, Analysis, CompetitionLevel, ProductCandidate, ScoredProduct};
use viral_hunter::scoring::{
    rescore_with_analysis, score_batch, AnalysisWeights, FactorScores, ScoringWeights, WeightedScorer,
};

fn candidate(name: &str, price: f64, orders: u64, rating: f64) -> ProductCandidate {
    ProductCandidate {
        name: name.to_string(),
        price,
        orders,
        rating,
        category: "gadgets".to_string(),
        why_viral: String::new(),
        link: String::new(),
    }
}

fn scorer(max_price: f64) -> WeightedScorer {
    WeightedScorer::new(ScoringWeights::default(), AnalysisWeights::default(), max_price)
}

#[test]
fn default_weights_sum_to_one() {
    assert!((ScoringWeights::default().sum() - 1.0).abs() < 1e-9);
    assert!((AnalysisWeights::default().sum() - 1.0).abs() < 1e-9);
}

#[test]
fn single_product_batch_has_full_order_score() {
    let product = candidate("Lonely Gadget", 20.0, 37, 4.0);
    let factors = FactorScores::compute(&product, 37, 40.0);
    assert!((factors.order_score - 1.0).abs() < 1e-9);

    let scored = score_batch(vec![product], &scorer(40.0));
    // 0.5 * 1.0 + 0.3 * 0.8 + 0.2 * 0.5
    assert!((scored[0].viral_score - 0.84).abs() < 1e-9);
}

#[test]
fn batch_of_three_ranks_by_orders() {
    let batch = vec![
        candidate("Product Alpha", 10.0, 100, 4.5),
        candidate("Product Bravo", 10.0, 50, 4.5),
        candidate("Product Charlie", 10.0, 10, 4.5),
    ];

    let orders: Vec<f64> = batch
        .iter()
        .map(|product| FactorScores::compute(product, 100, 100.0).order_score)
        .collect();
    assert_eq!(orders, vec![1.0, 0.5, 0.1]);

    let factors = FactorScores::compute(&batch[0], 100, 100.0);
    assert!((factors.rating_score - 0.9).abs() < 1e-9);
    assert!((factors.price_advantage - 0.9).abs() < 1e-9);

    let scored = score_batch(batch, &scorer(100.0));
    let names: Vec<&str> = scored.iter().map(|product| product.name()).collect();
    assert_eq!(names, vec!["Product Alpha", "Product Bravo", "Product Charlie"]);

    let scores: Vec<f64> = scored.iter().map(|product| product.viral_score).collect();
    assert_eq!(scores, vec![0.95, 0.7, 0.5]);
}

#[test]
fn output_is_descending_and_ties_keep_input_order() {
    let batch = vec![
        candidate("Tied First", 10.0, 500, 4.5),
        candidate("Top Seller", 10.0, 1000, 4.5),
        candidate("Tied Second", 10.0, 500, 4.5),
        candidate("Tied Third", 10.0, 500, 4.5),
    ];

    let scored = score_batch(batch, &scorer(40.0));
    for pair in scored.windows(2) {
        assert!(pair[0].viral_score >= pair[1].viral_score);
    }
    let names: Vec<&str> = scored.iter().map(|product| product.name()).collect();
    assert_eq!(names, vec!["Top Seller", "Tied First", "Tied Second", "Tied Third"]);
}

#[test]
fn scores_round_to_three_places() {
    let scored = score_batch(vec![candidate("Odd Priced Thing", 13.37, 700, 4.33)], &scorer(40.0));
    let score = scored[0].viral_score;
    assert!(((score * 1000.0).round() - score * 1000.0).abs() < 1e-6);
}

#[test]
fn analysis_pass_reorders_by_competition_and_niche() {
    let mut products = vec![
        ScoredProduct::new(candidate("Crowded Bestseller", 8.0, 1000, 4.5), 0.9),
        ScoredProduct::new(candidate("Hidden Gem Gadget", 8.0, 800, 4.5), 0.8),
    ];
    products[0].analysis = Some(Analysis {
        competition_level: CompetitionLevel::High,
        niche_score: 2,
        reasoning: String::new(),
    });
    products[1].analysis = Some(Analysis {
        competition_level: CompetitionLevel::Low,
        niche_score: 9,
        reasoning: String::new(),
    });

    rescore_with_analysis(&mut products, &scorer(40.0));

    assert_eq!(products[0].name(), "Hidden Gem Gadget");
    // 0.3*0.8 + 0.2*0.9 + 0.15*0.8 + 0.2*1.0 + 0.15*0.9
    assert!((products[0].viral_score - 0.875).abs() < 1e-9);
    // 0.3*1.0 + 0.2*0.9 + 0.15*0.8 + 0.2*0.15 + 0.15*0.2
    assert!((products[1].viral_score - 0.66).abs() < 1e-9);
}

#[test]
fn unanalyzed_products_use_unknown_and_default_niche() {
    let mut products = vec![ScoredProduct::new(candidate("Plain Gadget", 20.0, 600, 4.0), 0.0)];
    rescore_with_analysis(&mut products, &scorer(40.0));
    // 0.3*1 + 0.2*0.8 + 0.15*0.5 + 0.2*0.15 + 0.15*0.5
    assert!((products[0].viral_score - 0.64).abs() < 1e-9);
}

#[test]
fn history_prefix_rejects_longer_variant() {
    let raw = vec![
        json!({"name": "Mini Led Strip Light Pro Max", "price": 12.0, "orders": 4000, "rating": 4.6}),
        json!({"name": "Rechargeable Lint Remover", "price": 9.0, "orders": 2500, "rating": 4.5}),
    ];
    let seen = vec!["mini led strip light".to_string()];

    let kept = filter_candidates(normalize_batch(&raw), &seen, &FilterThresholds::default());
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].name, "Rechargeable Lint Remover");
}

#[test]
fn cents_prices_are_corrected_before_filtering() {
    let raw = vec![json!({"name": "Foldable Phone Stand", "price": 1899, "orders": 900, "rating": 47})];
    let kept = filter_candidates(normalize_batch(&raw), &[], &FilterThresholds::default());
    assert_eq!(kept.len(), 1);
    assert!((kept[0].price - 18.99).abs() < 1e-9);
    assert!((kept[0].rating - 4.7).abs() < 1e-9);
}
