use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::warn;

use crate::error::HunterError;
use crate::filter::FilterThresholds;
use crate::scoring::{AnalysisWeights, ScoringWeights};

const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    pub products_per_day: usize,
    pub max_days: u32,
    pub max_attempts: u32,
    pub retry_day_stride: u32,
    pub exclusion_limit: usize,
    pub weekly_report_interval: u32,
    pub cron: String,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            products_per_day: 10,
            max_days: 15,
            max_attempts: 3,
            retry_day_stride: 7,
            exclusion_limit: 50,
            weekly_report_interval: 7,
            cron: "0 0 5 * * *".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl StorageConfig {
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("history.json")
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }

    pub fn trends_path(&self) -> PathBuf {
        self.data_dir.join("trends.json")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_base: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub api_base: String,
    pub timeout_secs: u64,
    pub chunk_size: usize,
    pub chunk_delay_ms: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            timeout_secs: 10,
            chunk_size: 4000,
            chunk_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HunterConfig {
    pub filters: FilterThresholds,
    pub weights: ScoringWeights,
    pub analysis_weights: AnalysisWeights,
    pub campaign: CampaignConfig,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    pub telegram: TelegramConfig,
}

impl HunterConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), HunterError> {
        let config_path = path.or_else(default_config_path);
        let mut config = match config_path.as_ref() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(path)
                    .map_err(|err| HunterError::io(path.display().to_string(), err))?;
                toml::from_str(&contents)
                    .map_err(|err| HunterError::Config(format!("failed to parse config: {}", err)))?
            }
            _ => HunterConfig::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok((config, config_path))
    }

    pub fn validate(&self) -> Result<(), HunterError> {
        if self.campaign.products_per_day == 0 {
            return Err(HunterError::Config("products_per_day must be at least 1".to_string()));
        }
        if self.campaign.max_attempts == 0 {
            return Err(HunterError::Config("max_attempts must be at least 1".to_string()));
        }
        if self.filters.max_price <= 0.0 {
            return Err(HunterError::Config("max_price must be positive".to_string()));
        }

        let base = self.weights.sum();
        if (base - 1.0).abs() > WEIGHT_TOLERANCE {
            warn!(sum = base, "scoring weights do not sum to 1.0");
        }
        let analysis = self.analysis_weights.sum();
        if (analysis - 1.0).abs() > WEIGHT_TOLERANCE {
            warn!(sum = analysis, "analysis weights do not sum to 1.0");
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(value) = env_parse::<usize>("PRODUCTS_PER_DAY") {
            self.campaign.products_per_day = value;
        }
        if let Some(value) = env_parse::<u32>("MAX_DAYS") {
            self.campaign.max_days = value;
        }
        if let Some(value) = env_string("CRON_SCHEDULE") {
            self.campaign.cron = value;
        }
        if let Some(value) = env_string("HUNTER_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(value);
        }
        if let Some(value) = env_string("OPENAI_API_BASE") {
            self.llm.api_base = value;
        }
        if let Some(value) = env_string("OPENAI_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = env_parse::<u64>("MIN_ORDERS") {
            self.filters.min_orders = value;
        }
        if let Some(value) = env_parse::<f64>("MIN_RATING") {
            self.filters.min_rating = value;
        }
        if let Some(value) = env_parse::<f64>("MAX_PRICE") {
            self.filters.max_price = value;
        }
    }
}

pub fn normalize_cron(expr: &str) -> String {
    let fields = expr.split_whitespace().count();
    if fields == 5 {
        format!("0 {}", expr.trim())
    } else {
        expr.trim().to_string()
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|value| value.trim().parse().ok())
}

fn default_config_path() -> Option<PathBuf> {
    env_string("HUNTER_CONFIG_PATH")
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/hunter.toml")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let config = HunterConfig::default();
        assert!((config.weights.sum() - 1.0).abs() < WEIGHT_TOLERANCE);
        assert!((config.analysis_weights.sum() - 1.0).abs() < WEIGHT_TOLERANCE);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: HunterConfig = toml::from_str(
            r#"
            [campaign]
            products_per_day = 4

            [filters]
            min_orders = 1000
            min_rating = 4.5
            max_price = 25.0
            "#,
        )
        .unwrap();

        assert_eq!(config.campaign.products_per_day, 4);
        assert_eq!(config.campaign.max_days, 15);
        assert_eq!(config.filters.min_orders, 1000);
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn validate_rejects_zero_quota() {
        let mut config = HunterConfig::default();
        config.campaign.products_per_day = 0;
        assert!(matches!(config.validate(), Err(HunterError::Config(_))));
    }

    #[test]
    fn five_field_cron_gets_seconds() {
        assert_eq!(normalize_cron("0 5 * * *"), "0 0 5 * * *");
        assert_eq!(normalize_cron("0 0 5 * * *"), "0 0 5 * * *");
    }

    #[test]
    fn storage_paths_live_under_data_dir() {
        let storage = StorageConfig {
            data_dir: PathBuf::from("/tmp/hunter"),
        };
        assert_eq!(storage.state_path(), PathBuf::from("/tmp/hunter/state.json"));
        assert_eq!(storage.history_path(), PathBuf::from("/tmp/hunter/history.json"));
        assert_eq!(storage.trends_path(), PathBuf::from("/tmp/hunter/trends.json"));
    }
}
