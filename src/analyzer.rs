use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::error::HunterError;
use crate::llm::{Completion, LlmClient};
use crate::product::{clamp_niche_score, lenient_number, Analysis, CompetitionLevel, ScoredProduct};
use crate::sanitize::parse_json_array;
use crate::store::{History, HistoryRecord};
use crate::trends::{TrendBook, TrendLabel};

const WEEK_DAYS: u32 = 7;
const TOP_NICHE_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisEntry {
    pub index: usize,
    pub analysis: Analysis,
}

#[async_trait]
pub trait ProductAnalyst: Send + Sync {
    async fn analyze(&self, products: &[ScoredProduct]) -> Result<Vec<AnalysisEntry>, HunterError>;
}

#[async_trait]
pub trait ReportWriter: Send + Sync {
    async fn weekly_report(&self, stats: &WeeklyStats) -> Result<String, HunterError>;
}

pub fn parse_analysis_entries(items: &[Value]) -> Vec<AnalysisEntry> {
    items
        .iter()
        .filter_map(|item| {
            let index = item
                .get("index")
                .and_then(lenient_number)
                .filter(|index| *index >= 1.0)?
                .trunc() as usize;
            let competition_level = item
                .get("competitionLevel")
                .and_then(Value::as_str)
                .map(CompetitionLevel::parse)
                .unwrap_or_default();
            let reasoning = item
                .get("reasoning")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string();
            Some(AnalysisEntry {
                index,
                analysis: Analysis {
                    competition_level,
                    niche_score: clamp_niche_score(item.get("nicheScore")),
                    reasoning,
                },
            })
        })
        .collect()
}

/// Attaches analysis results. Every product gets an analysis: entries
/// matched by index override the defaults, out-of-range indices are ignored,
/// and a failed analysis leaves everything at the defaults.
pub fn apply_analysis(products: &mut [ScoredProduct], outcome: Result<Vec<AnalysisEntry>, HunterError>) {
    for product in products.iter_mut() {
        if product.analysis.is_none() {
            product.analysis = Some(Analysis::default());
        }
    }

    match outcome {
        Ok(entries) => {
            for entry in entries {
                if let Some(product) = entry
                    .index
                    .checked_sub(1)
                    .and_then(|idx| products.get_mut(idx))
                {
                    product.analysis = Some(entry.analysis);
                }
            }
            info!(count = products.len(), "competition and niche analysis applied");
        }
        Err(err) => {
            warn!(error = %err, "analysis failed; keeping default competition and niche scores");
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RisingProduct {
    pub name: String,
    pub appearances: usize,
}

#[derive(Debug, Clone, Default)]
pub struct WeeklyStats {
    pub day: u32,
    pub products: Vec<HistoryRecord>,
    pub categories: Vec<String>,
    pub rising: Vec<RisingProduct>,
    pub low_competition: usize,
    pub top_by_niche: Vec<HistoryRecord>,
}

impl WeeklyStats {
    pub fn collect(history: &History, trends: &TrendBook, day: u32) -> Self {
        let first_day = day.saturating_sub(WEEK_DAYS - 1).max(1);
        let products: Vec<HistoryRecord> = history
            .since_day(first_day)
            .into_iter()
            .filter(|record| record.day <= day)
            .cloned()
            .collect();

        let mut seen_categories = BTreeSet::new();
        let categories = products
            .iter()
            .filter(|record| seen_categories.insert(record.category.clone()))
            .map(|record| record.category.clone())
            .collect();

        let rising = trends
            .tracked
            .values()
            .filter(|entry| entry.trend == TrendLabel::Rising)
            .map(|entry| RisingProduct {
                name: entry.name.clone(),
                appearances: entry.appearances.len(),
            })
            .collect();

        let low_competition = products
            .iter()
            .filter(|record| record.competition_level == CompetitionLevel::Low)
            .count();

        let mut top_by_niche = products.clone();
        top_by_niche.sort_by(|a, b| b.niche_score.cmp(&a.niche_score));
        top_by_niche.truncate(TOP_NICHE_COUNT);

        Self {
            day,
            products,
            categories,
            rising,
            low_competition,
            top_by_niche,
        }
    }

    pub fn summary(&self) -> String {
        let top: Vec<String> = self
            .top_by_niche
            .iter()
            .map(|record| format!("{} ({}/10)", record.name, record.niche_score))
            .collect();
        format!(
            "Products analyzed this week: {}\nTop categories: {}\nRising products: {}\nLow competition finds: {}\nTop niche scores: {}",
            self.products.len(),
            self.categories.join(", "),
            self.rising.len(),
            self.low_competition,
            top.join(", ")
        )
    }
}

#[async_trait]
impl ProductAnalyst for LlmClient {
    async fn analyze(&self, products: &[ScoredProduct]) -> Result<Vec<AnalysisEntry>, HunterError> {
        if products.is_empty() {
            return Ok(Vec::new());
        }
        let prompt = analysis_prompt(products);
        let raw = self
            .complete(Completion {
                system: "You are a dropshipping market analyst. Return only valid JSON arrays. Be realistic and critical.",
                user: &prompt,
                temperature: 0.4,
                max_tokens: 3000,
            })
            .await?;
        let items = parse_json_array(&raw)?;
        Ok(parse_analysis_entries(&items))
    }
}

#[async_trait]
impl ReportWriter for LlmClient {
    async fn weekly_report(&self, stats: &WeeklyStats) -> Result<String, HunterError> {
        let prompt = weekly_prompt(stats);
        self.complete(Completion {
            system: "You are a senior dropshipping market strategist. Be direct, specific, and actionable.",
            user: &prompt,
            temperature: 0.7,
            max_tokens: 2000,
        })
        .await
    }
}

fn analysis_prompt(products: &[ScoredProduct]) -> String {
    let list: Vec<String> = products
        .iter()
        .enumerate()
        .map(|(idx, product)| {
            let candidate = &product.candidate;
            format!(
                "{}. \"{}\" — ${}, {} orders, {}★, category: {}",
                idx + 1,
                candidate.name,
                candidate.price,
                candidate.orders,
                candidate.rating,
                candidate.category
            )
        })
        .collect();

    format!(
        r#"You are a dropshipping market analyst. Analyze each product for:

1. COMPETITION LEVEL on Amazon/Shopify/mainstream stores:
   - "low" = hard to find on Amazon, unique or niche
   - "medium" = exists on Amazon but not dominated by big brands
   - "high" = saturated, sold by many Amazon/Shopify sellers, big brands dominate

2. NICHE SCORE (1-10) for dropshipping potential:
   - 10 = perfect: low competition, high demand, good margins, impulse buy, easy to ship
   - 7-9 = great opportunity
   - 4-6 = decent but competitive
   - 1-3 = poor: saturated, low margins, or shipping issues

3. Brief reasoning (1 sentence)

Products to analyze:
{list}

Respond ONLY with a valid JSON array. No markdown, no backticks.
[
  {{
    "index": 1,
    "competitionLevel": "low",
    "nicheScore": 8,
    "reasoning": "Unique gadget not widely available on Amazon, high impulse buy potential"
  }}
]"#,
        list = list.join("\n")
    )
}

fn weekly_prompt(stats: &WeeklyStats) -> String {
    let products: Vec<String> = stats
        .products
        .iter()
        .map(|record| {
            format!(
                "- {} | ${} | {} orders | Competition: {} | Niche: {}/10",
                record.name,
                record.price,
                record.orders,
                record.competition_level.label(),
                record.niche_score
            )
        })
        .collect();
    let rising = if stats.rising.is_empty() {
        "None yet".to_string()
    } else {
        stats
            .rising
            .iter()
            .map(|entry| format!("- {}: appeared {} times, orders growing", entry.name, entry.appearances))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"You are a senior dropshipping strategist. Write a brief weekly market intelligence report based on this data:

{summary}

All products found this week:
{products}

Rising trends:
{rising}

Write a concise report covering:
1. TOP 3 OPPORTUNITIES this week (with why)
2. CATEGORIES to watch next week
3. PRODUCTS TO AVOID (high competition)
4. EMERGING TRENDS spotted
5. One bold PREDICTION for next week

Keep it under 400 words. Be specific, actionable, and direct."#,
        summary = stats.summary(),
        products = products.join("\n"),
        rising = rising
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::ProductCandidate;
    use chrono::NaiveDate;
    use serde_json::json;

    fn scored(name: &str) -> ScoredProduct {
        ScoredProduct::new(
            ProductCandidate {
                name: name.to_string(),
                price: 14.0,
                orders: 2000,
                rating: 4.4,
                category: "travel gear".to_string(),
                why_viral: String::new(),
                link: String::new(),
            },
            0.6,
        )
    }

    #[test]
    fn entries_parse_leniently() {
        let items = vec![
            json!({"index": 1, "competitionLevel": "LOW", "nicheScore": 12, "reasoning": " rare "}),
            json!({"index": 2, "competitionLevel": "cutthroat", "nicheScore": "abc"}),
            json!({"competitionLevel": "low"}),
            json!({"index": "3", "competitionLevel": "medium", "nicheScore": 6}),
            json!({"index": 0, "competitionLevel": "low"}),
        ];
        let entries = parse_analysis_entries(&items);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].index, 3);
        assert_eq!(entries[2].analysis.competition_level, CompetitionLevel::Medium);
        assert_eq!(entries[0].analysis.competition_level, CompetitionLevel::Low);
        assert_eq!(entries[0].analysis.niche_score, 10);
        assert_eq!(entries[0].analysis.reasoning, "rare");
        assert_eq!(entries[1].analysis.competition_level, CompetitionLevel::Unknown);
        assert_eq!(entries[1].analysis.niche_score, 5);
    }

    #[test]
    fn apply_matches_by_position_and_ignores_out_of_range() {
        let mut products = vec![scored("Packing Cubes Set"), scored("Neck Pillow Memory")];
        let entries = vec![
            AnalysisEntry {
                index: 2,
                analysis: Analysis {
                    competition_level: CompetitionLevel::High,
                    niche_score: 3,
                    reasoning: "saturated".to_string(),
                },
            },
            AnalysisEntry {
                index: 9,
                analysis: Analysis::default(),
            },
        ];
        apply_analysis(&mut products, Ok(entries));

        assert_eq!(products[0].analysis, Some(Analysis::default()));
        assert_eq!(products[1].competition_level(), CompetitionLevel::High);
        assert_eq!(products[1].niche_score(), Some(3));
    }

    #[test]
    fn failed_analysis_applies_defaults_everywhere() {
        let mut products = vec![scored("Packing Cubes Set"), scored("Neck Pillow Memory")];
        apply_analysis(&mut products, Err(HunterError::Parse("nope".to_string())));
        for product in &products {
            assert_eq!(product.competition_level(), CompetitionLevel::Unknown);
            assert_eq!(product.niche_score(), Some(5));
            assert!(product.analysis.as_ref().unwrap().reasoning.is_empty());
        }
    }

    #[test]
    fn weekly_stats_cover_last_seven_days() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();
        let mut history = History::default();
        for day in 1..=8 {
            let mut product = scored(&format!("Gadget number {}", day));
            product.analysis = Some(Analysis {
                competition_level: if day % 2 == 0 { CompetitionLevel::Low } else { CompetitionLevel::High },
                niche_score: day as u8,
                reasoning: String::new(),
            });
            history.append_day(&[product], day, date);
        }

        let stats = WeeklyStats::collect(&history, &TrendBook::default(), 8);
        assert_eq!(stats.products.len(), 7);
        assert_eq!(stats.products[0].day, 2);
        assert_eq!(stats.categories, vec!["travel gear".to_string()]);
        assert_eq!(stats.low_competition, 4);
        assert_eq!(stats.top_by_niche.len(), 5);
        assert_eq!(stats.top_by_niche[0].niche_score, 8);
        assert!(stats.summary().contains("Products analyzed this week: 7"));
    }
}
