//! keymon terminal dashboard
//!
//! Mounts the active-key panel against a backend and prints every refresh.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

use clap::{Parser, Subcommand, ValueEnum};
use keymon_core::Config;
use keymon_dashboard::{
    BackendClient, DashboardError, DashboardPanel, KeyLineView, PanelSnapshot, Phase,
    ReloadTracker, Result, refresh_keys, render,
};
use std::path::PathBuf;
use tokio::signal;
use tracing::{debug, info, warn};

/// Command line interface for the keymon dashboard
#[derive(Parser)]
#[command(
    name = "keymon",
    version = env!("CARGO_PKG_VERSION"),
    about = "Polling dashboard for the active API keys of a backend",
    long_about = "Polls the backend's /keys/active endpoint on a fixed delay and prints one line per active key after every refresh."
)]
struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable structured JSON logging
    #[arg(long)]
    json: bool,

    /// Backend base URL (overrides config)
    #[arg(long, env = "KEYMON_BASE_URL", value_name = "URL")]
    base_url: Option<String>,

    /// API key sent to the backend (overrides config)
    #[arg(long, env = "KEYMON_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Delay between refreshes in milliseconds (overrides config)
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Subcommand
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Keep refreshing and print the panel after every refresh (default)
    Watch,

    /// Fetch the active keys once and print them
    Keys {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Inspect configuration
    Config {
        /// Show resolved configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Main entry point for the dashboard
///
/// # Errors
///
/// Returns error if configuration is invalid or the panel fails to stop cleanly
#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = load_config(&cli)?;
    keymon_core::init_logging(&config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.backend.base_url,
        "keymon starting"
    );

    match cli.command {
        Some(Commands::Watch) | None => watch(&config).await,
        Some(Commands::Keys { format }) => print_keys_once(&config, format).await,
        Some(Commands::Config { show }) => {
            if show {
                println!("{}", config.to_toml()?);
            } else {
                println!("Configuration is valid");
            }
            Ok(())
        }
    }
}

/// Resolve configuration from file or environment, then apply CLI overrides
///
/// # Errors
///
/// Returns error if the configuration cannot be loaded or fails validation
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match cli.config.as_deref() {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    if let Some(ref base_url) = cli.base_url {
        config.backend.base_url.clone_from(base_url);
    }
    if let Some(ref api_key) = cli.api_key {
        config.backend.api_key = Some(api_key.clone());
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.panel.refresh_delay_ms = interval_ms;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level.clone_from(level);
    }
    if cli.json {
        config.logging.format = "json".to_string();
    }

    config.validate()?;
    Ok(config)
}

/// Mount the panel and print every settled refresh until Ctrl+C
///
/// # Errors
///
/// Returns error if the panel cannot be built or stopped
async fn watch(config: &Config) -> Result<()> {
    let handle = DashboardPanel::from_config(config)?.mount();
    let mut snapshots = handle.subscribe();
    let mut tracker = ReloadTracker::new();

    info!("Dashboard running. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping dashboard");
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    warn!("Dashboard loop ended unexpectedly");
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.phase == Phase::Waiting {
                    print_panel(&snapshot, &mut tracker);
                }
            }
        }
    }

    let stats = handle.stats();
    handle.stop().await?;

    info!(
        cycles = stats.cycles,
        failures = stats.failures,
        "Dashboard stopped"
    );
    Ok(())
}

fn print_panel(snapshot: &PanelSnapshot, tracker: &mut ReloadTracker) {
    let view = render(snapshot);

    let reloads = tracker.reconcile(&view);
    debug!(count = reloads.len(), keys = ?reloads, "Detail views to reload");

    println!(
        "Active keys: {} (refresh #{})",
        view.len(),
        snapshot.refresh_token
    );
    for line in view.draw(&KeyLineView) {
        println!("  {line}");
    }
}

/// Run a single refresh cycle and print the result
///
/// # Errors
///
/// Returns error if the backend client cannot be built or output cannot be serialized
async fn print_keys_once(config: &Config, format: OutputFormat) -> Result<()> {
    let client = BackendClient::new(config.backend.clone())?;
    let outcome = refresh_keys(&client).await;

    if !outcome.succeeded {
        warn!("Backend did not return a key list");
    }

    match format {
        OutputFormat::Text => {
            for key in &outcome.keys {
                println!("{key}");
            }
        }
        OutputFormat::Json => {
            let body = keymon_core::ActiveKeysResponse { keys: outcome.keys };
            let json = serde_json::to_string_pretty(&body)
                .map_err(|e| DashboardError::Core(e.into()))?;
            println!("{json}");
        }
    }

    Ok(())
}
