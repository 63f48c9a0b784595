//! Daemon Infrastructure - periodic trigger for extraction cycles
//!
//! This module provides the background service that invokes one extraction
//! cycle on a configurable cadence, with graceful shutdown handling. The
//! daemon owns the cadence only; cycle semantics live in the extractor.

use crate::asana::AsanaClient;
use crate::config::Config;
use crate::extractor::Extractor;
use crate::storage::LocalStorage;
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{debug, info};

/// Daemon state and control
#[derive(Debug)]
pub struct Daemon {
    config: Arc<Config>,
    extractor: Extractor,
    shutdown_sender: broadcast::Sender<()>,
    is_running: Arc<AtomicBool>,
}

impl Daemon {
    /// Create a new daemon instance, wiring storage, client and extractor
    /// from configuration. Construction fails fast on configuration errors.
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);

        let storage = LocalStorage::new(&config.storage_directory)
            .context("Failed to initialize storage for daemon")?;
        let client =
            AsanaClient::new(&config.asana).context("Failed to create Asana client for daemon")?;
        let extractor = Extractor::new(Arc::new(client), Arc::new(storage))
            .with_timeout(Duration::from_secs(config.extraction.cycle_timeout));

        let (shutdown_sender, _) = broadcast::channel(1);

        Ok(Self {
            config,
            extractor,
            shutdown_sender,
            is_running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Run the daemon in the foreground until a shutdown signal arrives.
    pub async fn run(&mut self) -> Result<()> {
        info!("Starting taskmirror daemon");

        self.is_running.store(true, Ordering::SeqCst);

        let shutdown_receiver = self.shutdown_sender.subscribe();

        // Spawn shutdown signal handler
        let is_running = self.is_running.clone();
        let shutdown_sender = self.shutdown_sender.clone();
        tokio::spawn(async move {
            Self::wait_for_shutdown_signal().await;
            info!("Shutdown signal received, stopping daemon...");
            is_running.store(false, Ordering::SeqCst);
            let _ = shutdown_sender.send(());
        });

        let result = self.daemon_loop(shutdown_receiver).await;

        self.is_running.store(false, Ordering::SeqCst);
        info!("Daemon stopped");

        result
    }

    /// Main daemon loop - runs periodic extraction cycles
    async fn daemon_loop(&self, mut shutdown_receiver: broadcast::Receiver<()>) -> Result<()> {
        let interval_secs = parse_interval(&self.config.daemon.interval)
            .context("Failed to parse daemon extraction interval")?;
        let mut interval_timer = interval(Duration::from_secs(interval_secs));

        info!(interval_secs, "Daemon loop started");

        // Skip the first immediate tick
        interval_timer.tick().await;

        loop {
            tokio::select! {
                // Shutdown signal received
                _ = shutdown_receiver.recv() => {
                    info!("Shutdown signal received in daemon loop");
                    break;
                }

                // Extraction interval elapsed
                _ = interval_timer.tick() => {
                    if !self.is_running.load(Ordering::SeqCst) {
                        break;
                    }

                    debug!("Starting scheduled extraction cycle");
                    self.extractor.run_extraction_cycle().await;
                }
            }
        }

        info!("Daemon loop exiting");
        Ok(())
    }

    /// Wait for shutdown signals (Ctrl+C / SIGINT)
    async fn wait_for_shutdown_signal() {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for ctrl-c");
        debug!("Ctrl+C received");
    }
}

/// Parse interval strings like "30s", "5m", "1h", "2d" into seconds.
fn parse_interval(interval: &str) -> Result<u64> {
    let interval = interval.trim().to_lowercase();

    if let Some(value) = interval.strip_suffix('s') {
        value.parse::<u64>().context("Invalid seconds value")
    } else if let Some(value) = interval.strip_suffix('m') {
        value
            .parse::<u64>()
            .map(|v| v * 60)
            .context("Invalid minutes value")
    } else if let Some(value) = interval.strip_suffix('h') {
        value
            .parse::<u64>()
            .map(|v| v * 3600)
            .context("Invalid hours value")
    } else if let Some(value) = interval.strip_suffix('d') {
        value
            .parse::<u64>()
            .map(|v| v * 86400)
            .context("Invalid days value")
    } else {
        // Try to parse as raw seconds
        interval
            .parse::<u64>()
            .context("Invalid interval format. Use format like '30s', '5m', '1h'")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_config(storage_dir: &str) -> Config {
        let mut config = Config::default();
        config.storage_directory = storage_dir.to_string();
        config.asana.workspace = "1200000000000001".to_string();
        config.asana.token = Some("test-token".to_string());
        config
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("30s").unwrap(), 30);
        assert_eq!(parse_interval("5m").unwrap(), 300);
        assert_eq!(parse_interval("1h").unwrap(), 3600);
        assert_eq!(parse_interval("2d").unwrap(), 172800);
        assert_eq!(parse_interval("90").unwrap(), 90);
        assert_eq!(parse_interval(" 10M ").unwrap(), 600);

        assert!(parse_interval("soon").is_err());
        assert!(parse_interval("m").is_err());
        assert!(parse_interval("").is_err());
    }

    #[test]
    fn test_daemon_creation() {
        let temp_dir = tempdir().unwrap();
        let config = test_config(temp_dir.path().to_str().unwrap());

        let daemon = Daemon::new(config).unwrap();
        assert!(!daemon.is_running.load(Ordering::SeqCst));
    }

    #[test]
    fn test_daemon_creation_fails_without_storage_directory() {
        let config = test_config("/nonexistent/taskmirror-data");

        let result = Daemon::new(config);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to initialize storage"));
    }
}
