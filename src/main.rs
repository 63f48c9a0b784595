use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use taskmirror::{AsanaClient, Config, Daemon, Extractor, LocalStorage};

#[derive(Parser)]
#[command(name = "taskmirror")]
#[command(about = "Asana workspace extraction daemon")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one extraction cycle and exit
    Extract,

    /// Run periodic extraction cycles in the foreground
    Daemon,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = load_config(cli.config)?;

    init_logging(cli.verbose, &config)?;
    info!("Starting taskmirror v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Extract => cmd_extract(&config).await,
        Commands::Daemon => cmd_daemon(config).await,
    }
}

/// Initialize logging from the verbose flag, with the configured level as
/// fallback. RUST_LOG always wins when set.
fn init_logging(verbose: bool, config: &Config) -> Result<()> {
    let default_directive = if verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(config.logging.color))
        .with(filter)
        .init();

    Ok(())
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<std::path::PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(&path),
        None => Config::load_or_default(),
    }
}

/// Run one extraction cycle
async fn cmd_extract(config: &Config) -> Result<()> {
    let storage = LocalStorage::new(&config.storage_directory)
        .context("Failed to initialize storage")?;
    info!(dir = %storage.dir().display(), "Writing entities to storage directory");

    let client = AsanaClient::new(&config.asana).context("Failed to create Asana client")?;

    let extractor = Extractor::new(Arc::new(client), Arc::new(storage))
        .with_timeout(Duration::from_secs(config.extraction.cycle_timeout));

    extractor
        .extract_all()
        .await
        .context("Extraction cycle failed")?;

    info!("Extraction complete");
    Ok(())
}

/// Run the periodic extraction daemon in the foreground
async fn cmd_daemon(config: Config) -> Result<()> {
    let mut daemon = Daemon::new(config).context("Failed to create daemon")?;
    daemon.run().await
}
