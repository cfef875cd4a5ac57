use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

use crate::analyzer::{apply_analysis, ProductAnalyst, ReportWriter, WeeklyStats};
use crate::config::HunterConfig;
use crate::discovery::{DiscoveryOrchestrator, ProductSource};
use crate::error::HunterError;
use crate::notify::Messenger;
use crate::product::ScoredProduct;
use crate::report::{format_daily_report, format_trend_report, format_weekly_report};
use crate::scoring::{rescore_with_analysis, WeightedScorer};
use crate::store::{CampaignStore, History, RunState};
use crate::trends::{TrendBook, TrendSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyRanToday,
    CampaignComplete,
}

#[derive(Debug, Clone)]
pub struct DayReport {
    pub day: u32,
    pub date: NaiveDate,
    pub products: Vec<ScoredProduct>,
    pub delivered: bool,
    pub trend_summary: Option<TrendSummary>,
    pub weekly_report_sent: bool,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(DayReport),
    Skipped(SkipReason),
}

impl RunOutcome {
    pub fn campaign_finished(&self, max_days: u32) -> bool {
        match self {
            RunOutcome::Completed(report) => report.day >= max_days,
            RunOutcome::Skipped(SkipReason::CampaignComplete) => true,
            RunOutcome::Skipped(SkipReason::AlreadyRanToday) => false,
        }
    }
}

#[derive(Clone)]
pub struct Collaborators {
    pub source: Arc<dyn ProductSource>,
    pub analyst: Arc<dyn ProductAnalyst>,
    pub reporter: Arc<dyn ReportWriter>,
    pub messenger: Arc<dyn Messenger>,
}

pub struct RunController {
    config: HunterConfig,
    store: CampaignStore,
    scorer: WeightedScorer,
    discovery: DiscoveryOrchestrator,
    collaborators: Collaborators,
}

impl RunController {
    pub fn new(config: HunterConfig, collaborators: Collaborators) -> Self {
        let scorer = WeightedScorer::new(
            config.weights.clone(),
            config.analysis_weights.clone(),
            config.filters.max_price,
        );
        let discovery = DiscoveryOrchestrator::new(
            Arc::clone(&collaborators.source),
            scorer.clone(),
            config.filters.clone(),
            config.campaign.clone(),
        );
        Self {
            store: CampaignStore::new(&config.storage),
            config,
            scorer,
            discovery,
            collaborators,
        }
    }

    pub fn config(&self) -> &HunterConfig {
        &self.config
    }

    pub async fn load_state(&self) -> RunState {
        self.store.load_state().await
    }

    pub fn eligibility(&self, state: &RunState, today: NaiveDate) -> Option<SkipReason> {
        if state.current_day >= self.config.campaign.max_days {
            return Some(SkipReason::CampaignComplete);
        }
        if state.last_run_date == Some(today) {
            return Some(SkipReason::AlreadyRanToday);
        }
        None
    }

    /// Runs the next campaign day if one is due on `today`. Only persistence
    /// failures are returned as errors.
    pub async fn run_day(&self, today: NaiveDate) -> Result<RunOutcome, HunterError> {
        let state = self.store.load_state().await;
        let max_days = self.config.campaign.max_days;

        if let Some(reason) = self.eligibility(&state, today) {
            match reason {
                SkipReason::CampaignComplete => {
                    info!(max_days, "all campaign days completed; nothing to do")
                }
                SkipReason::AlreadyRanToday => info!(%today, "already ran today; skipping"),
            }
            return Ok(RunOutcome::Skipped(reason));
        }

        let day = state.current_day + 1;
        info!(day, max_days, %today, "starting campaign day");

        let mut history = self.store.load_history().await;
        if history.has_day(day) {
            return self.finish_recorded_day(&history, day, today).await;
        }

        let seen = history.seen_names();
        let mut products = self.discovery.discover(day, &seen).await;

        let mut delivered = false;
        let mut trend_summary = None;
        let mut weekly_report_sent = false;

        if products.is_empty() {
            warn!(day, "no qualifying products found today");
        } else {
            let analysis = self.collaborators.analyst.analyze(&products).await;
            apply_analysis(&mut products, analysis);
            rescore_with_analysis(&mut products, &self.scorer);
            products.truncate(self.config.campaign.products_per_day);

            for (idx, product) in products.iter().enumerate() {
                info!(
                    rank = idx + 1,
                    name = %product.name(),
                    price = product.candidate.price,
                    orders = product.candidate.orders,
                    rating = product.candidate.rating,
                    score = product.viral_score,
                    "selected product"
                );
            }

            delivered = self
                .collaborators
                .messenger
                .deliver(&format_daily_report(&products, day, today))
                .await;

            let mut trends = self.store.load_trends().await;
            trends.update(&products, day);
            let summary = trends.summary(day);
            self.collaborators
                .messenger
                .deliver(&format_trend_report(&summary, day))
                .await;
            trend_summary = Some(summary);

            history.append_day(&products, day, today);

            if self.weekly_report_due(day) {
                weekly_report_sent = self.send_weekly_report(&history, &trends, day).await;
            }

            self.store.save_history(&history).await?;
            self.store.save_trends(&trends).await?;
        }

        self.store
            .save_state(&RunState {
                current_day: day,
                last_run_date: Some(today),
            })
            .await?;

        info!(
            day,
            selected = products.len(),
            history_total = history.products.len(),
            "campaign day complete"
        );

        Ok(RunOutcome::Completed(DayReport {
            day,
            date: today,
            products,
            delivered,
            trend_summary,
            weekly_report_sent,
        }))
    }

    /// A previous run recorded `day` in history but stopped before saving
    /// state. Completes it from the saved records without rediscovering or
    /// sending reports again.
    async fn finish_recorded_day(
        &self,
        history: &History,
        day: u32,
        today: NaiveDate,
    ) -> Result<RunOutcome, HunterError> {
        let products = history.day_products(day);
        warn!(
            day,
            recorded = products.len(),
            "history already holds this day; finishing interrupted run from saved records"
        );

        let mut trends = self.store.load_trends().await;
        trends.update(&products, day);
        self.store.save_trends(&trends).await?;
        self.store
            .save_state(&RunState {
                current_day: day,
                last_run_date: Some(today),
            })
            .await?;

        Ok(RunOutcome::Completed(DayReport {
            day,
            date: today,
            products,
            delivered: false,
            trend_summary: Some(trends.summary(day)),
            weekly_report_sent: false,
        }))
    }

    fn weekly_report_due(&self, day: u32) -> bool {
        let interval = self.config.campaign.weekly_report_interval;
        interval > 0 && day % interval == 0
    }

    async fn send_weekly_report(
        &self,
        history: &History,
        trends: &TrendBook,
        day: u32,
    ) -> bool {
        let stats = WeeklyStats::collect(history, trends, day);
        info!(day, products = stats.products.len(), "generating weekly report");
        match self.collaborators.reporter.weekly_report(&stats).await {
            Ok(report) => {
                self.collaborators
                    .messenger
                    .deliver(&format_weekly_report(&report, day))
                    .await
            }
            Err(err) => {
                warn!(day, error = %err, "weekly report failed; skipping");
                false
            }
        }
    }
}
