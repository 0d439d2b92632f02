// ABOUTME: Main entry point for the butler service
// ABOUTME: Initializes logging, config and scheduled tasks, then serves the HTTP API and ticker

use anyhow::{Context, Result};
use butler::{butler::Butler, config::Config, metrics, paths, scheduler, webhook};
use butler_core::TaskScheduler;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Personal automation butler: chat and API intents, gears and scheduled tasks
#[derive(Parser, Debug)]
#[command(name = "butler", version)]
struct Args {
    /// Config file (default: BUTLER_CONFIG_PATH, ./config.toml, then the XDG config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the configuration
    #[arg(short, long)]
    port: Option<u16>,

    /// Scheduled tasks file, overriding the configuration
    #[arg(short, long)]
    tasks: Option<PathBuf>,

    /// Do not start the in-process hourly ticker even if configured
    #[arg(long)]
    no_ticker: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the tasks file and list the tasks due at a given instant
    CheckTasks {
        /// RFC 3339 instant, defaults to now
        #[arg(long)]
        at: Option<String>,
    },
}

fn init_logging() -> Result<WorkerGuard> {
    let log_dir = paths::log_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "butler.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    Ok(guard)
}

/// Load scheduled tasks. A missing default tasks file means no tasks; a
/// missing file that was asked for explicitly is an error.
fn load_tasks(config: &Config, cli_path: Option<&Path>) -> Result<TaskScheduler> {
    let explicit = cli_path.is_some() || config.scheduler.tasks_file.is_some();
    let path = cli_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.tasks_path());

    if !path.exists() && !explicit {
        tracing::info!(path = %path.display(), "No tasks file found, scheduler has nothing to do");
        return Ok(TaskScheduler::default());
    }

    let scheduler = TaskScheduler::load(&path)?;
    for problem in scheduler.validate() {
        tracing::warn!(problem = %problem, "Scheduled task will never run");
    }
    Ok(scheduler)
}

fn check_tasks(scheduler: &TaskScheduler, at: Option<&str>) -> Result<()> {
    let at: DateTime<Utc> = match at {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("Invalid instant '{}', expected RFC 3339", raw))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let problems = scheduler.validate();
    for problem in &problems {
        println!("invalid: {}", problem);
    }

    println!("{} task(s) loaded, due at {}:", scheduler.tasks().len(), at.to_rfc3339());
    for task in scheduler.find_due(&at) {
        println!("  {} ({} {}) -> {}", task.name, task.when, task.timezone, task.intent);
    }

    if !problems.is_empty() {
        anyhow::bail!("{} task(s) are malformed", problems.len());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();
    let _log_guard = init_logging()?;

    let mut config = Config::load_from(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let tasks = load_tasks(&config, args.tasks.as_deref())?;

    if let Some(Command::CheckTasks { at }) = args.command {
        return check_tasks(&tasks, at.as_deref());
    }

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        telegram = config.telegram.is_some(),
        notify_admin = config.notify_admin.is_some(),
        tasks = tasks.tasks().len(),
        "Configuration loaded"
    );

    let metrics_handle = match metrics::init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Metrics disabled");
            None
        }
    };

    let run_ticker = config.scheduler.run_ticker && !args.no_ticker;
    let butler = Arc::new(Butler::from_config(config, tasks).await?);

    if run_ticker {
        tokio::spawn(scheduler::start_ticker(Arc::clone(&butler)));
    }

    webhook::start_server(butler, metrics_handle).await
}
