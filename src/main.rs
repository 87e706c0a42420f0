use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use jobpoll::adapters::{TerminalBoard, poll_settled};
use jobpoll::config::{self, AppConfig};
use jobpoll::core::{CycleOutcome, HttpJobSource, PollEvent, Poller};
use jobpoll::logging;
use serde::Serialize;
use tokio::sync::{Mutex, broadcast};

#[derive(Parser)]
#[command(name = "jobpoll")]
#[command(about = "Job status poller", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the TOML config file
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll until interrupted, printing the job board after every cycle
    Watch(PollArgs),
    /// Run a single cycle and print the job board
    Once(PollArgs),
    /// Print the effective configuration
    Config(PollArgs),
}

#[derive(Args, Serialize)]
struct PollArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    jobs_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    type_filter: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    initial_delay_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    success_interval_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    failure_interval_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    request_timeout_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    verbose: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    json_logs: Option<bool>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = match &cli.command {
        Commands::Watch(args) | Commands::Once(args) | Commands::Config(args) => args,
    };
    let config = AppConfig::load(&cli.config, Some(args))
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    match &cli.command {
        Commands::Watch(_) => {
            logging::init(config.log_config());
            run_watch(&config).await.context("Watch failed")?
        }
        Commands::Once(_) => {
            logging::init(config.log_config());
            run_once(&config).await.context("Poll failed")?
        }
        Commands::Config(_) => print_config(&config)?,
    }

    Ok(())
}

fn build_source(config: &AppConfig) -> Result<HttpJobSource> {
    match config.request_timeout() {
        Some(timeout) => {
            HttpJobSource::with_timeout(timeout).context("Failed to build HTTP client")
        }
        None => Ok(HttpJobSource::new()),
    }
}

fn build_board(config: &AppConfig) -> Result<TerminalBoard> {
    let jobs_url = config
        .jobs_url
        .as_deref()
        .context("No jobs url configured (use --jobs-url or JOBPOLL_JOBS_URL)")?;
    Ok(TerminalBoard::new(jobs_url, config.type_filter.as_deref()))
}

async fn run_watch(config: &AppConfig) -> Result<()> {
    let board = Arc::new(Mutex::new(build_board(config)?));
    let poller = Poller::new(board.clone(), build_source(config)?, config.poller_settings());
    let mut events = poller.subscribe();
    let handle = poller.start();

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                tracing::info!("Interrupted, stopping poller");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => show_event(&board, &event).await?,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Board fell behind poll events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    handle.stop().await;
    Ok(())
}

async fn run_once(config: &AppConfig) -> Result<()> {
    let board = Arc::new(Mutex::new(build_board(config)?));
    let poller = Poller::new(board.clone(), build_source(config)?, config.poller_settings());

    poll_settled(&poller, &board).await?;

    let board = board.lock().await;
    let mut stdout = std::io::stdout();
    board.render(&mut stdout, chrono::Utc::now())?;
    stdout.flush()?;
    Ok(())
}

async fn show_event(board: &Mutex<TerminalBoard>, event: &PollEvent) -> Result<()> {
    let mut board = board.lock().await;

    match &event.outcome {
        CycleOutcome::Resynced { records, .. } => board.render_rows(records),
        // Failures are logged by the poller; keep showing the last known state.
        CycleOutcome::Failed(_) => return Ok(()),
        CycleOutcome::Updated { .. } => {}
    }

    let mut stdout = std::io::stdout();
    writeln!(stdout)?;
    board.render(&mut stdout, event.polled_at)?;
    stdout.flush()?;
    Ok(())
}

fn print_config(config: &AppConfig) -> Result<()> {
    let text = toml::to_string_pretty(config).context("Failed to serialize config")?;
    print!("{}", text);
    Ok(())
}
