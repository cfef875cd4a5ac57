use serde::{Deserialize, Serialize};
use serde_json::Value;

const SEARCH_BASE: &str = "https://www.aliexpress.com/wholesale?SearchText=";
const CENTS_THRESHOLD: f64 = 500.0;
const RATING_CEILING: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCandidate {
    pub name: String,
    pub price: f64,
    pub orders: u64,
    pub rating: f64,
    pub category: String,
    pub why_viral: String,
    pub link: String,
}

impl ProductCandidate {
    pub fn key(&self) -> String {
        normalize_name(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionLevel {
    Low,
    Medium,
    High,
    #[default]
    #[serde(other)]
    Unknown,
}

impl CompetitionLevel {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "low" => CompetitionLevel::Low,
            "medium" => CompetitionLevel::Medium,
            "high" => CompetitionLevel::High,
            _ => CompetitionLevel::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CompetitionLevel::Low => "low",
            CompetitionLevel::Medium => "medium",
            CompetitionLevel::High => "high",
            CompetitionLevel::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub competition_level: CompetitionLevel,
    pub niche_score: u8,
    pub reasoning: String,
}

impl Default for Analysis {
    fn default() -> Self {
        Self {
            competition_level: CompetitionLevel::Unknown,
            niche_score: DEFAULT_NICHE_SCORE,
            reasoning: String::new(),
        }
    }
}

pub const DEFAULT_NICHE_SCORE: u8 = 5;

pub fn clamp_niche_score(value: Option<&Value>) -> u8 {
    match value.and_then(lenient_number) {
        Some(score) if score.trunc() != 0.0 => score.trunc().clamp(1.0, 10.0) as u8,
        _ => DEFAULT_NICHE_SCORE,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredProduct {
    pub candidate: ProductCandidate,
    pub viral_score: f64,
    pub analysis: Option<Analysis>,
}

impl ScoredProduct {
    pub fn new(candidate: ProductCandidate, viral_score: f64) -> Self {
        Self {
            candidate,
            viral_score,
            analysis: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.candidate.name
    }

    pub fn competition_level(&self) -> CompetitionLevel {
        self.analysis
            .as_ref()
            .map(|analysis| analysis.competition_level)
            .unwrap_or_default()
    }

    pub fn niche_score(&self) -> Option<u8> {
        self.analysis.as_ref().map(|analysis| analysis.niche_score)
    }
}

/// Canonicalizes one raw product object. Never fails: fields that are
/// missing or unparseable fall back to empty/zero so the filter rejects them.
///
/// Normalizing an already-normalized record is a no-op only while the raw
/// price is at most 50000 and the raw rating at most 50. Above that a second
/// pass divides again (60000 reads as 600, then 6).
pub fn normalize(raw: &Value) -> ProductCandidate {
    let mut price = number_field(raw, "price").max(0.0);
    let mut rating = number_field(raw, "rating").max(0.0);
    let orders = number_field(raw, "orders").max(0.0).trunc() as u64;

    if price > CENTS_THRESHOLD {
        price /= 100.0;
    }
    if rating > RATING_CEILING {
        rating /= 10.0;
    }

    let name = text_field(raw, "name");
    let query = match text_field(raw, "searchQuery") {
        query if !query.is_empty() => query,
        _ => name.clone(),
    };

    ProductCandidate {
        link: search_link(&query),
        name,
        price,
        orders,
        rating,
        category: text_field(raw, "category"),
        why_viral: text_field(raw, "whyViral"),
    }
}

pub fn normalize_batch(raw: &[Value]) -> Vec<ProductCandidate> {
    raw.iter().map(normalize).collect()
}

pub fn search_link(query: &str) -> String {
    format!("{}{}", SEARCH_BASE, urlencoding::encode(query.trim()))
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn text_field(raw: &Value, field: &str) -> String {
    match raw.get(field) {
        Some(Value::String(value)) => value.trim().to_string(),
        Some(Value::Number(value)) => value.to_string(),
        _ => String::new(),
    }
}

fn number_field(raw: &Value, field: &str) -> f64 {
    raw.get(field).and_then(lenient_number).unwrap_or(0.0)
}

pub(crate) fn lenient_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => leading_number(text),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

fn leading_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (idx, ch) in trimmed.char_indices() {
        match ch {
            '+' | '-' if idx == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = idx + ch.len_utf8();
    }

    if !seen_digit {
        return None;
    }
    trimmed[..end].trim_end_matches('.').parse().ok()
}
