use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use viral_hunter::config::normalize_cron;
use viral_hunter::{
    format_float, Collaborators, HunterConfig, HunterError, LlmClient, RunController, RunOutcome,
    TelegramMessenger,
};

#[derive(Parser)]
#[command(name = "viral-hunter", about = "Daily viral product hunter")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run now, then keep running on the cron schedule until the campaign ends.
    Schedule,
    /// Run a single eligible day and exit.
    Once,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    init_tracing();
    if let Err(err) = run().await {
        error!(error = %err, "fatal error");
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), HunterError> {
    let cli = Cli::parse();
    let (config, config_path) = HunterConfig::load(cli.config)?;
    if let Some(path) = config_path.filter(|path| path.exists()) {
        info!(path = %path.display(), "loaded config");
    }

    let controller = Arc::new(build_controller(config)?);
    match cli.command.unwrap_or(Command::Schedule) {
        Command::Once => run_once(&controller).await,
        Command::Schedule => run_scheduled(controller).await,
    }
}

fn build_controller(config: HunterConfig) -> Result<RunController, HunterError> {
    let llm = Arc::new(LlmClient::from_env(&config.llm)?);
    info!(model = llm.model(), "language model client ready");
    let messenger = Arc::new(TelegramMessenger::from_env(&config.telegram)?);
    if !messenger.is_configured() {
        info!("telegram credentials missing; reports will only be logged");
    }
    let collaborators = Collaborators {
        source: llm.clone(),
        analyst: llm.clone(),
        reporter: llm,
        messenger,
    };
    Ok(RunController::new(config, collaborators))
}

async fn run_once(controller: &RunController) -> Result<(), HunterError> {
    let outcome = controller.run_day(Utc::now().date_naive()).await?;
    print_outcome(&outcome);
    Ok(())
}

async fn run_scheduled(controller: Arc<RunController>) -> Result<(), HunterError> {
    let max_days = controller.config().campaign.max_days;
    let state = controller.load_state().await;
    info!(day = state.current_day, max_days, "current campaign state");

    let outcome = controller.run_day(Utc::now().date_naive()).await?;
    print_outcome(&outcome);
    if outcome.campaign_finished(max_days) {
        info!("all days completed; exiting");
        return Ok(());
    }

    let cron = normalize_cron(&controller.config().campaign.cron);
    let finished = Arc::new(Notify::new());
    let mut scheduler = JobScheduler::new()
        .await
        .map_err(|err| HunterError::Scheduler(err.to_string()))?;

    let job_controller = Arc::clone(&controller);
    let job_finished = Arc::clone(&finished);
    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let controller = Arc::clone(&job_controller);
        let finished = Arc::clone(&job_finished);
        Box::pin(async move {
            info!("scheduled run triggered");
            match controller.run_day(Utc::now().date_naive()).await {
                Ok(outcome) => {
                    print_outcome(&outcome);
                    if outcome.campaign_finished(max_days) {
                        finished.notify_one();
                    }
                }
                Err(err) => error!(error = %err, "scheduled run failed"),
            }
        })
    })
    .map_err(|err| HunterError::Scheduler(err.to_string()))?;

    scheduler
        .add(job)
        .await
        .map_err(|err| HunterError::Scheduler(err.to_string()))?;
    scheduler
        .start()
        .await
        .map_err(|err| HunterError::Scheduler(err.to_string()))?;
    info!(cron = %cron, "waiting for next scheduled run");

    finished.notified().await;
    info!("all days completed; exiting");
    scheduler
        .shutdown()
        .await
        .map_err(|err| HunterError::Scheduler(err.to_string()))
}

fn print_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Completed(report) => {
            println!(
                "Day {} complete: {} products (delivered: {})",
                report.day,
                report.products.len(),
                report.delivered
            );
            for (idx, product) in report.products.iter().enumerate() {
                println!(
                    "  {}. {} | ${} | {} orders | {}★ | score {}",
                    idx + 1,
                    product.name().chars().take(55).collect::<String>(),
                    format_float(product.candidate.price, 2),
                    product.candidate.orders,
                    product.candidate.rating,
                    format_float(product.viral_score, 3)
                );
            }
        }
        RunOutcome::Skipped(reason) => println!("Skipped: {:?}", reason),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
