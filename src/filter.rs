use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::product::{normalize_name, ProductCandidate};

const MIN_NAME_CHARS: usize = 5;
const PREFIX_CHARS: usize = 20;
const PREFIX_MIN_LEN: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterThresholds {
    pub min_orders: u64,
    pub min_rating: f64,
    pub max_price: f64,
}

impl Default for FilterThresholds {
    fn default() -> Self {
        Self {
            min_orders: 500,
            min_rating: 4.3,
            max_price: 40.0,
        }
    }
}

pub fn passes_thresholds(candidate: &ProductCandidate, thresholds: &FilterThresholds) -> bool {
    candidate.orders >= thresholds.min_orders
        && candidate.rating >= thresholds.min_rating
        && candidate.price > 0.0
        && candidate.price <= thresholds.max_price
        && candidate.name.chars().count() > MIN_NAME_CHARS
}

/// Fuzzy containment check against names from earlier days.
///
/// Matches on exact equality, or when the first 20 characters of either
/// name (only for names longer than 10 characters) occur inside the other.
pub fn is_seen(name: &str, seen: &[String]) -> bool {
    let name = normalize_name(name);
    let name_len = name.chars().count();
    let name_prefix = char_prefix(&name, PREFIX_CHARS);

    seen.iter().any(|seen_name| {
        if *seen_name == name {
            return true;
        }
        if seen_name.chars().count() > PREFIX_MIN_LEN
            && name.contains(char_prefix(seen_name, PREFIX_CHARS))
        {
            return true;
        }
        name_len > PREFIX_MIN_LEN && seen_name.contains(name_prefix)
    })
}

pub fn filter_candidates(
    candidates: Vec<ProductCandidate>,
    seen: &[String],
    thresholds: &FilterThresholds,
) -> Vec<ProductCandidate> {
    let eligible: Vec<ProductCandidate> = candidates
        .into_iter()
        .filter(|candidate| passes_thresholds(candidate, thresholds))
        .collect();
    debug!(count = eligible.len(), "candidates meeting thresholds");

    let fresh: Vec<ProductCandidate> = eligible
        .into_iter()
        .filter(|candidate| !is_seen(&candidate.name, seen))
        .collect();
    debug!(count = fresh.len(), "candidates after history dedup");

    fresh
}

fn char_prefix(value: &str, chars: usize) -> &str {
    match value.char_indices().nth(chars) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}
