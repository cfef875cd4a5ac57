pub mod analyzer;
pub mod config;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod llm;
pub mod notify;
pub mod product;
pub mod report;
pub mod runner;
pub mod sanitize;
pub mod scoring;
pub mod store;
pub mod trends;

pub use analyzer::{AnalysisEntry, ProductAnalyst, ReportWriter, WeeklyStats};
pub use config::HunterConfig;
pub use discovery::{DiscoveryOrchestrator, DiscoveryRequest, ProductSource};
pub use error::HunterError;
pub use filter::{filter_candidates, is_seen, passes_thresholds, FilterThresholds};
pub use llm::LlmClient;
pub use notify::{Messenger, TelegramMessenger};
pub use product::{normalize, Analysis, CompetitionLevel, ProductCandidate, ScoredProduct};
pub use runner::{Collaborators, DayReport, RunController, RunOutcome, SkipReason};
pub use store::{CampaignStore, History, HistoryRecord, RunState};
pub use trends::{TrendBook, TrendEntry, TrendLabel, TrendSummary};

pub fn format_number(value: f64) -> String {
    let rounded = value.round().max(0.0) as i64;
    let mut chars: Vec<char> = rounded.to_string().chars().collect();
    let mut result = String::new();
    let mut count = 0usize;

    while let Some(ch) = chars.pop() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(ch);
        count += 1;
    }

    result.chars().rev().collect()
}

pub fn format_float(value: f64, digits: usize) -> String {
    format!("{:.1$}", value, digits)
}
