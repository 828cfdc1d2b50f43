//! # Crest Logger
//!
//! Log Automobilista 2 session telemetry from the CREST2 HTTP endpoint.
//!
//! Polls CREST2 once per second and writes every ready snapshot of a session
//! into `{log_dir}/{epoch-millis}.json` as a JSON array.

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{error, info};

use crest_logger::config::{self, Config, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use crest_logger::coordinator::{Coordinator, TracingObserver};
use crest_logger::crest::CrestClient;
use crest_logger::poller::TelemetryPoller;
use crest_logger::telemetry::SessionLog;

/// Capacity of the coordinator to poller command channel
const COMMAND_CHANNEL_CAPACITY: usize = 4;

/// Main entry point for Crest Logger
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load `.env`, then configuration (file, then environment overrides)
///    - Spawn the poller task
///
/// 2. **Main Loop**
///    - Coordinator sends `load`, then `fetch` once loading completes
///    - Poller emits lifecycle events every poll interval
///    - Coordinator writes session logs as events arrive
///
/// 3. **Graceful Shutdown**
///    - Ctrl+C seals the open session log before exit
///
/// # Errors
///
/// Returns error if the configuration is invalid or the HTTP client cannot
/// be built. An unreachable CREST2 endpoint is not an error.
#[tokio::main]
async fn main() -> Result<()> {
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .with_writer(writer)
        .init();

    info!("Crest Logger v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Some(path) = config::load_dotenv() {
        info!("Environment loaded from {}", path.display());
    }

    let config_path = std::env::var(CONFIG_PATH_ENV)
        .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;
    config.apply_env().context("Invalid environment override")?;

    let client = CrestClient::new(&config.crest)?;
    info!("CREST2 endpoint: {}", client.url());
    info!("Session logs: {}", config.logging.log_dir);

    let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel(config.channel.capacity);

    let poller = TelemetryPoller::new(client, config.crest.poll_interval());
    let poller_task = tokio::spawn(async move {
        if let Err(e) = poller.run(command_rx, event_tx).await {
            error!("Poller stopped: {}", e);
        }
    });

    let log = SessionLog::new(&config.logging.log_dir);
    let mut coordinator = Coordinator::new(log, TracingObserver).with_commands(command_tx);
    coordinator.start().await?;

    info!("Press Ctrl+C to exit");
    coordinator
        .run(event_rx, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Received Ctrl+C");
        })
        .await?;

    poller_task.abort();
    Ok(())
}
