use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::product::{normalize_name, ScoredProduct};

const GROWTH_THRESHOLD_PCT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendLabel {
    #[default]
    New,
    Rising,
    Stable,
    Declining,
}

impl TrendLabel {
    pub fn label(self) -> &'static str {
        match self {
            TrendLabel::New => "🆕 new",
            TrendLabel::Rising => "📈 rising",
            TrendLabel::Stable => "➡️ stable",
            TrendLabel::Declining => "📉 declining",
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Older trend files stored the emoji display label.
impl<'de> Deserialize<'de> for TrendLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let lowered = raw.to_lowercase();
        let label = if lowered.contains("rising") {
            TrendLabel::Rising
        } else if lowered.contains("declining") {
            TrendLabel::Declining
        } else if lowered.contains("stable") {
            TrendLabel::Stable
        } else {
            TrendLabel::New
        };
        Ok(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appearance {
    pub day: u32,
    pub orders: u64,
    pub price: f64,
    pub rating: f64,
    pub viral_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendEntry {
    pub name: String,
    pub category: String,
    pub first_seen: u32,
    pub appearances: Vec<Appearance>,
    #[serde(default)]
    pub trend: TrendLabel,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendBook {
    #[serde(default)]
    pub tracked: BTreeMap<String, TrendEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct TrendSummary {
    pub rising: Vec<TrendEntry>,
    pub declining: Vec<TrendEntry>,
    pub stable: Vec<TrendEntry>,
    pub new_today: Vec<TrendEntry>,
    pub total: usize,
}

pub fn growth_pct(previous: u64, latest: u64) -> Option<f64> {
    if previous == 0 {
        return None;
    }
    Some((latest as f64 - previous as f64) * 100.0 / previous as f64)
}

pub fn classify(appearances: &[Appearance]) -> TrendLabel {
    let [.., previous, latest] = appearances else {
        return TrendLabel::New;
    };

    match growth_pct(previous.orders, latest.orders) {
        Some(growth) if growth > GROWTH_THRESHOLD_PCT => TrendLabel::Rising,
        Some(growth) if growth < -GROWTH_THRESHOLD_PCT => TrendLabel::Declining,
        Some(_) => TrendLabel::Stable,
        // Growth from zero is unbounded; zero to zero is flat.
        None if latest.orders > 0 => TrendLabel::Rising,
        None => TrendLabel::Stable,
    }
}

impl TrendBook {
    pub fn update(&mut self, products: &[ScoredProduct], day: u32) {
        for product in products {
            let candidate = &product.candidate;
            let entry = self
                .tracked
                .entry(normalize_name(&candidate.name))
                .or_insert_with(|| TrendEntry {
                    name: candidate.name.clone(),
                    category: candidate.category.clone(),
                    first_seen: day,
                    appearances: Vec::new(),
                    trend: TrendLabel::New,
                });

            if entry.appearances.last().is_some_and(|last| last.day == day) {
                continue;
            }

            entry.appearances.push(Appearance {
                day,
                orders: candidate.orders,
                price: candidate.price,
                rating: candidate.rating,
                viral_score: product.viral_score,
            });
        }

        self.relabel();
    }

    pub fn relabel(&mut self) {
        for entry in self.tracked.values_mut() {
            entry.trend = classify(&entry.appearances);
        }
    }

    pub fn summary(&self, day: u32) -> TrendSummary {
        let mut summary = TrendSummary {
            total: self.tracked.len(),
            ..TrendSummary::default()
        };

        for entry in self.tracked.values() {
            match entry.trend {
                TrendLabel::Rising => summary.rising.push(entry.clone()),
                TrendLabel::Declining => summary.declining.push(entry.clone()),
                TrendLabel::Stable => summary.stable.push(entry.clone()),
                TrendLabel::New if entry.first_seen == day => summary.new_today.push(entry.clone()),
                TrendLabel::New => {}
            }
        }

        summary
    }

    pub fn get(&self, name: &str) -> Option<&TrendEntry> {
        self.tracked.get(&normalize_name(name))
    }
}
