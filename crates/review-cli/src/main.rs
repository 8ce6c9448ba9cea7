mod config;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{fmt, EnvFilter};

use review_core::{
    CycleOutcome, Credentials, HttpStatusClient, Notifier, TelegramSink, ValidCredentials,
    WatchConfig, Watcher,
};

use crate::config::AppConfig;

fn version_string() -> &'static str {
    static VERSION: OnceLock<String> = OnceLock::new();
    VERSION.get_or_init(|| {
        let version = env!("CARGO_PKG_VERSION");
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            version.to_string()
        } else {
            format!("{version} ({hash})")
        }
    })
}

/// Homework review watcher: reports review status changes to a Telegram chat.
///
/// Credentials are read from TELEGRAM_CHAT_ID, TELEGRAM_TOKEN and
/// PRACTICUM_TOKEN, either in the environment or in a `.env` file.
#[derive(Parser)]
#[command(name = "review-watch", version = version_string(), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the status endpoint forever and report changes.
    Watch {
        /// Path to TOML config file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seconds to sleep after every cycle. Overrides config file.
        #[arg(long)]
        retry_period: Option<u64>,

        /// Also write logs to this file. Overrides config file.
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Run a single poll cycle, print the outcome and exit.
    Once {
        /// Path to TOML config file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Unix timestamp to poll from (default: now).
        #[arg(long)]
        from_date: Option<i64>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // A missing .env file is fine; variables may come from the real environment.
    let _ = dotenvy::dotenv();

    match cli.command {
        Commands::Watch {
            config,
            retry_period,
            log_file,
        } => run_watch(config, retry_period, log_file).await,
        Commands::Once { config, from_date } => run_once(config, from_date).await,
    }
}

async fn run_watch(
    config_path: Option<PathBuf>,
    retry_period: Option<u64>,
    log_file: Option<PathBuf>,
) {
    let app_config = load_config_or_exit(config_path.as_deref());
    let log_file = log_file.or_else(|| app_config.log.file.clone());
    if let Err(e) = init_tracing(&app_config.log.format, log_file.as_deref()) {
        eprintln!("{} {}", style("error:").red().bold(), e);
        std::process::exit(1);
    }

    let mut watch_config = watch_config_or_exit(&app_config);
    if let Some(secs) = retry_period {
        watch_config = watch_config.with_retry_period(secs);
    }

    let credentials = require_credentials();
    let watcher = build_watcher_or_exit(&watch_config, credentials);

    println!(
        "{} {}",
        style("review-watch").bold(),
        style(version_string()).dim()
    );
    println!(
        "  {} {}",
        style("endpoint:").dim(),
        style(watch_config.endpoint.as_str()).bold()
    );
    println!(
        "  {} {}s",
        style("retry:   ").dim(),
        watch_config.retry_period.as_secs()
    );
    if let Some(ref path) = log_file {
        println!("  {} {}", style("log file:").dim(), path.display());
    }
    println!();
    println!("{}", style("Press Ctrl+C to stop").dim());
    println!();

    tracing::info!("Bot started");

    tokio::select! {
        _ = watcher.run() => {}
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received, exiting");
        }
    }
}

async fn run_once(config_path: Option<PathBuf>, from_date: Option<i64>) {
    let app_config = load_config_or_exit(config_path.as_deref());
    if let Err(e) = init_tracing(&app_config.log.format, None) {
        eprintln!("{} {}", style("error:").red().bold(), e);
        std::process::exit(1);
    }

    let watch_config = watch_config_or_exit(&app_config);
    let credentials = require_credentials();
    let mut watcher = build_watcher_or_exit(&watch_config, credentials);
    if let Some(ts) = from_date {
        watcher = watcher.with_cursor(ts);
    }

    let from = watcher.cursor();
    let outcome = watcher.poll_once().await;
    match outcome {
        CycleOutcome::Notified { message, cursor } => {
            println!("{} {}", style("NOTIFIED").green().bold(), message);
            println!("  {} {} -> {}", style("cursor:").dim(), from, cursor);
        }
        CycleOutcome::Idle => {
            println!(
                "{} no new reviews since {}",
                style("IDLE").green(),
                from
            );
        }
        CycleOutcome::DeliveryFailed { message } => {
            println!("{} {}", style("UNDELIVERED").yellow().bold(), message);
            std::process::exit(2);
        }
        CycleOutcome::Failed { error, reported } => {
            println!(
                "{} {} {}",
                style("ERROR").red().bold(),
                error,
                style(if reported { "(reported to chat)" } else { "(not reported)" }).dim()
            );
            std::process::exit(1);
        }
    }
}

fn load_config_or_exit(path: Option<&Path>) -> AppConfig {
    match AppConfig::load_or_default(path) {
        Ok(c) => c,
        Err(e) => {
            init_tracing("pretty", None).ok();
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn watch_config_or_exit(app_config: &AppConfig) -> WatchConfig {
    match app_config.to_watch_config() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Validates credentials, logging every missing variable before exiting.
fn require_credentials() -> ValidCredentials {
    match Credentials::from_env().validate() {
        Ok(credentials) => credentials,
        Err(e) => {
            for variable in e.missing() {
                tracing::error!(
                    variable,
                    "Missing required environment variable {}, refusing to start",
                    variable
                );
            }
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn build_watcher_or_exit(config: &WatchConfig, credentials: ValidCredentials) -> Watcher {
    let client = match HttpStatusClient::build_client(config.request_timeout) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build HTTP client");
            std::process::exit(1);
        }
    };

    let fetcher = HttpStatusClient::from_config(config, client.clone(), credentials.source_token);
    let sink = TelegramSink::new(client, config.telegram_api.clone(), credentials.bot_token);
    let notifier = Notifier::new(Arc::new(sink), credentials.chat_id);

    Watcher::new(Arc::new(fetcher), notifier, config)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn init_tracing(log_format: &str, log_file: Option<&Path>) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file = match log_file {
        Some(path) => Some(Arc::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| format!("Failed to open log file {}: {}", path.display(), e))?,
        )),
        None => None,
    };

    match (log_format, file) {
        ("json", Some(file)) => {
            fmt()
                .with_env_filter(filter)
                .json()
                .with_writer(std::io::stdout.and(file))
                .init();
        }
        ("json", None) => {
            fmt().with_env_filter(filter).json().init();
        }
        (_, Some(file)) => {
            fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::io::stdout.and(file))
                .init();
        }
        (_, None) => {
            fmt().with_env_filter(filter).init();
        }
    }

    Ok(())
}
