use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::CampaignConfig;
use crate::error::HunterError;
use crate::filter::{filter_candidates, FilterThresholds};
use crate::llm::{Completion, LlmClient};
use crate::product::{normalize_batch, normalize_name, ScoredProduct};
use crate::sanitize::parse_json_array;
use crate::scoring::{score_batch, WeightedScorer};

pub const CATEGORIES: [&str; 20] = [
    "smart home gadgets",
    "kitchen tools and gadgets",
    "car accessories",
    "phone accessories",
    "fitness and gym equipment",
    "LED lights and lighting",
    "cleaning tools",
    "beauty and skincare tools",
    "pet accessories",
    "travel gear",
    "desk and office gadgets",
    "outdoor and camping gear",
    "baby and kids products",
    "gaming accessories",
    "portable electronics",
    "mini projectors and displays",
    "wireless audio devices",
    "smart watches and wearables",
    "home organization",
    "DIY tools and accessories",
];

const CATEGORIES_PER_DAY: usize = 5;
const EXTRA_REQUESTED: usize = 5;
const EXTRA_KEPT_PER_ATTEMPT: usize = 3;

#[derive(Debug, Clone)]
pub struct DiscoveryRequest {
    pub rotation_day: u32,
    pub categories: Vec<&'static str>,
    pub target_count: usize,
    pub thresholds: FilterThresholds,
    pub exclusions: Vec<String>,
}

#[async_trait]
pub trait ProductSource: Send + Sync {
    async fn propose(&self, request: &DiscoveryRequest) -> Result<Vec<Value>, HunterError>;
}

pub fn categories_for_day(day: u32) -> Vec<&'static str> {
    let start = (day.saturating_sub(1) as usize * CATEGORIES_PER_DAY) % CATEGORIES.len();
    (0..CATEGORIES_PER_DAY)
        .map(|offset| CATEGORIES[(start + offset) % CATEGORIES.len()])
        .collect()
}

pub fn recent_exclusions(seen: &[String], limit: usize) -> Vec<String> {
    seen[seen.len().saturating_sub(limit)..].to_vec()
}

pub fn merge_unique(accepted: &mut Vec<ScoredProduct>, batch: Vec<ScoredProduct>) -> usize {
    let mut added = 0;
    for product in batch {
        let key = normalize_name(product.name());
        if accepted
            .iter()
            .any(|existing| normalize_name(existing.name()) == key)
        {
            continue;
        }
        accepted.push(product);
        added += 1;
    }
    added
}

pub struct DiscoveryOrchestrator {
    source: Arc<dyn ProductSource>,
    scorer: WeightedScorer,
    thresholds: FilterThresholds,
    campaign: CampaignConfig,
}

impl DiscoveryOrchestrator {
    pub fn new(
        source: Arc<dyn ProductSource>,
        scorer: WeightedScorer,
        thresholds: FilterThresholds,
        campaign: CampaignConfig,
    ) -> Self {
        Self {
            source,
            scorer,
            thresholds,
            campaign,
        }
    }

    pub async fn discover(&self, day: u32, seen: &[String]) -> Vec<ScoredProduct> {
        let target = self.campaign.products_per_day;
        let mut accepted: Vec<ScoredProduct> = Vec::new();
        let mut attempt = 0;

        while accepted.len() < target && attempt < self.campaign.max_attempts {
            let rotation_day = day + attempt * self.campaign.retry_day_stride;
            attempt += 1;
            if attempt > 1 {
                info!(day, attempt, rotation_day, "retrying discovery");
            }

            let scored = self.run_attempt(rotation_day, attempt, seen).await;
            let added = merge_unique(&mut accepted, scored);
            info!(day, attempt, added, total = accepted.len(), "discovery attempt merged");
        }

        accepted.truncate(target);
        accepted
    }

    async fn run_attempt(&self, rotation_day: u32, attempt: u32, seen: &[String]) -> Vec<ScoredProduct> {
        let request = DiscoveryRequest {
            rotation_day,
            categories: categories_for_day(rotation_day),
            target_count: self.campaign.products_per_day + EXTRA_REQUESTED,
            thresholds: self.thresholds.clone(),
            exclusions: recent_exclusions(seen, self.campaign.exclusion_limit),
        };
        info!(
            attempt,
            categories = %request.categories.join(", "),
            excluded = seen.len(),
            "requesting product proposals"
        );

        let raw = match self.source.propose(&request).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(attempt, error = %err, "product proposal failed; attempt yields nothing");
                return Vec::new();
            }
        };
        info!(attempt, received = raw.len(), "received product proposals");

        let candidates = filter_candidates(normalize_batch(&raw), seen, &self.thresholds);
        let mut scored = score_batch(candidates, &self.scorer);
        scored.truncate(self.campaign.products_per_day + EXTRA_KEPT_PER_ATTEMPT);
        scored
    }
}

#[async_trait]
impl ProductSource for LlmClient {
    async fn propose(&self, request: &DiscoveryRequest) -> Result<Vec<Value>, HunterError> {
        let prompt = discovery_prompt(request);
        let raw = self
            .complete(Completion {
                system: DISCOVERY_SYSTEM,
                user: &prompt,
                temperature: 0.9,
                max_tokens: 4000,
            })
            .await?;
        parse_json_array(&raw)
    }
}

const DISCOVERY_SYSTEM: &str = "You are a product research expert. Return ONLY a valid JSON array. \
Prices must be decimals like 25.99, ratings decimals like 4.7, orders integers like 5200.";

fn discovery_prompt(request: &DiscoveryRequest) -> String {
    let thresholds = &request.thresholds;
    let exclusion = if request.exclusions.is_empty() {
        String::new()
    } else {
        let lines: Vec<String> = request
            .exclusions
            .iter()
            .map(|name| format!("- {}", name))
            .collect();
        format!(
            "\n\nDO NOT include any of these previously found products (or very similar ones):\n{}",
            lines.join("\n")
        )
    };

    format!(
        r#"You are a viral product research expert specializing in AliExpress trending products.

Find exactly {count} REAL viral products currently trending on AliExpress across these categories: {categories}.

REQUIREMENTS:
- Products must be REAL items that actually exist and sell well on AliExpress right now
- Each product must have estimated orders above {min_orders}
- Each product must have a rating of {min_rating} or higher (out of 5.0)
- Each product price must be under ${max_price}
- Focus on products trending on TikTok, Instagram, or other social platforms
- Prioritize UNIQUE products that are NOT easily found on Amazon
- Products should have mass appeal and impulse buy potential

CRITICAL FORMAT RULES:
- "price" must be a decimal number like 25.99 (NOT 2599)
- "rating" must be a decimal out of 5.0 like 4.7 (NOT 47)
- "orders" must be an integer like 5200 (NOT "5.2K")
- "searchQuery" must be a short 2-4 word search term for AliExpress{exclusion}

Respond ONLY with a valid JSON array. No markdown, no backticks, no explanation.

[
  {{
    "name": "Mini Portable Bluetooth Speaker Waterproof",
    "price": 15.99,
    "orders": 8500,
    "rating": 4.7,
    "category": "portable electronics",
    "whyViral": "Trending on TikTok for outdoor use",
    "searchQuery": "portable bluetooth speaker"
  }}
]"#,
        count = request.target_count,
        categories = request.categories.join(", "),
        min_orders = thresholds.min_orders,
        min_rating = thresholds.min_rating,
        max_price = thresholds.max_price,
        exclusion = exclusion,
    )
}
