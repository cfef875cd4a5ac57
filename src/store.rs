use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::StorageConfig;
use crate::error::HunterError;
use crate::product::{normalize_name, Analysis, CompetitionLevel, ProductCandidate, ScoredProduct};
use crate::trends::TrendBook;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub name: String,
    pub link: String,
    pub price: f64,
    pub orders: u64,
    pub rating: f64,
    pub category: String,
    #[serde(default)]
    pub competition_level: CompetitionLevel,
    #[serde(default)]
    pub niche_score: u8,
    #[serde(default)]
    pub viral_score: f64,
    pub day: u32,
    pub date: NaiveDate,
}

impl HistoryRecord {
    pub fn from_product(product: &ScoredProduct, day: u32, date: NaiveDate) -> Self {
        let candidate = &product.candidate;
        Self {
            name: candidate.name.clone(),
            link: candidate.link.clone(),
            price: candidate.price,
            orders: candidate.orders,
            rating: candidate.rating,
            category: candidate.category.clone(),
            competition_level: product.competition_level(),
            niche_score: product.niche_score().unwrap_or(0),
            viral_score: product.viral_score,
            day,
            date,
        }
    }

    pub fn to_product(&self) -> ScoredProduct {
        let candidate = ProductCandidate {
            name: self.name.clone(),
            price: self.price,
            orders: self.orders,
            rating: self.rating,
            category: self.category.clone(),
            why_viral: String::new(),
            link: self.link.clone(),
        };
        let mut product = ScoredProduct::new(candidate, self.viral_score);
        if self.niche_score > 0 {
            product.analysis = Some(Analysis {
                competition_level: self.competition_level,
                niche_score: self.niche_score,
                reasoning: String::new(),
            });
        }
        product
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    pub products: Vec<HistoryRecord>,
}

impl History {
    pub fn seen_names(&self) -> Vec<String> {
        self.products
            .iter()
            .map(|record| normalize_name(&record.name))
            .collect()
    }

    pub fn has_day(&self, day: u32) -> bool {
        self.products.iter().any(|record| record.day == day)
    }

    /// Appends the day's selection. Returns `false` without touching the
    /// history if records for `day` already exist.
    pub fn append_day(&mut self, products: &[ScoredProduct], day: u32, date: NaiveDate) -> bool {
        if self.has_day(day) {
            return false;
        }
        self.products.extend(
            products
                .iter()
                .map(|product| HistoryRecord::from_product(product, day, date)),
        );
        true
    }

    pub fn day_products(&self, day: u32) -> Vec<ScoredProduct> {
        self.products
            .iter()
            .filter(|record| record.day == day)
            .map(HistoryRecord::to_product)
            .collect()
    }

    pub fn since_day(&self, first_day: u32) -> Vec<&HistoryRecord> {
        self.products
            .iter()
            .filter(|record| record.day >= first_day)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    #[serde(default)]
    pub current_day: u32,
    #[serde(default)]
    pub last_run_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct CampaignStore {
    history_path: PathBuf,
    state_path: PathBuf,
    trends_path: PathBuf,
}

impl CampaignStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            history_path: config.history_path(),
            state_path: config.state_path(),
            trends_path: config.trends_path(),
        }
    }

    pub async fn load_history(&self) -> History {
        load_or_default(&self.history_path).await
    }

    pub async fn save_history(&self, history: &History) -> Result<(), HunterError> {
        persist(&self.history_path, history).await
    }

    pub async fn load_state(&self) -> RunState {
        load_or_default(&self.state_path).await
    }

    pub async fn save_state(&self, state: &RunState) -> Result<(), HunterError> {
        persist(&self.state_path, state).await
    }

    pub async fn load_trends(&self) -> TrendBook {
        load_or_default(&self.trends_path).await
    }

    pub async fn save_trends(&self, trends: &TrendBook) -> Result<(), HunterError> {
        persist(&self.trends_path, trends).await
    }
}

async fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let data = match tokio::fs::read_to_string(path).await {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return T::default(),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read document, using default");
            return T::default();
        }
    };

    if data.trim().is_empty() {
        return T::default();
    }

    serde_json::from_str(&data).unwrap_or_else(|err| {
        warn!(path = %path.display(), error = %err, "corrupt document, using default");
        T::default()
    })
}

async fn persist<T: Serialize>(path: &Path, value: &T) -> Result<(), HunterError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }
    let payload = serde_json::to_string_pretty(value)
        .map_err(|err| HunterError::Parse(format!("failed to serialize {}: {}", path.display(), err)))?;
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, payload)
        .await
        .map_err(|err| HunterError::io(tmp_path.display().to_string(), err))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|err| HunterError::io(path.display().to_string(), err))
}

async fn ensure_dir(path: &Path) -> Result<(), HunterError> {
    if path.as_os_str().is_empty() || path.exists() {
        return Ok(());
    }
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|err| HunterError::io(path.display().to_string(), err))
}
