use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable consulted when the config file carries no token.
pub const TOKEN_ENV_VAR: &str = "ASANA_TOKEN";

/// Main configuration structure for taskmirror
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Base directory entity files are written to
    pub storage_directory: String,

    /// Asana API access settings
    #[serde(default)]
    pub asana: AsanaConfig,

    /// Extraction behavior settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Daemon configuration
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Asana API configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AsanaConfig {
    /// Workspace whose users and projects are extracted
    #[serde(default)]
    pub workspace: String,

    /// Personal access token; falls back to the ASANA_TOKEN environment
    /// variable when unset, so the secret can stay out of the config file
    pub token: Option<String>,

    /// Transport-level timeout per request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

/// Extraction configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExtractionConfig {
    /// Wall-clock budget for one extraction cycle, in seconds
    #[serde(default = "default_cycle_timeout")]
    pub cycle_timeout: u64,
}

/// Daemon configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DaemonConfig {
    /// Enable daemon mode
    #[serde(default)]
    pub enabled: bool,

    /// Extraction interval
    #[serde(default = "default_interval")]
    pub interval: String, // "5m"
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"

    /// Log format
    #[serde(default = "default_log_format")]
    pub format: String, // "compact"

    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,
}

// Default value functions
fn default_true() -> bool {
    true
}
fn default_request_timeout() -> u64 {
    30
}
fn default_cycle_timeout() -> u64 {
    60
}
fn default_interval() -> String {
    "5m".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "compact".to_string()
}

// Default implementations
impl Default for AsanaConfig {
    fn default() -> Self {
        Self {
            workspace: String::new(),
            token: None,
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            cycle_timeout: default_cycle_timeout(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: default_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            color: default_true(),
        }
    }
}

impl AsanaConfig {
    /// Resolve the access token from the config file or the environment.
    /// Empty values count as unset; never returns an empty token.
    pub fn resolve_token(&self) -> Option<String> {
        if let Some(token) = &self.token {
            if !token.is_empty() {
                return Some(token.clone());
            }
        }

        std::env::var(TOKEN_ENV_VAR)
            .ok()
            .filter(|token| !token.is_empty())
    }
}

impl Config {
    /// Load configuration from the default location or create a default config
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            let config = Self::default();

            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
            }

            config.save(&config_path)?;

            tracing::info!("Created default configuration at: {:?}", config_path);
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        // Expand environment variables in paths
        config.expand_paths()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("taskmirror").join("config.yml"))
    }

    /// Expand environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.storage_directory = shellexpand::full(&self.storage_directory)
            .context("Failed to expand storage_directory path")?
            .into_owned();

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_directory: "${HOME}/taskmirror".to_string(),
            asana: AsanaConfig::default(),
            extraction: ExtractionConfig::default(),
            daemon: DaemonConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_default_values() {
        let config = Config::default();

        assert_eq!(config.storage_directory, "${HOME}/taskmirror");
        assert_eq!(config.asana.workspace, "");
        assert!(config.asana.token.is_none());
        assert_eq!(config.asana.request_timeout, 30);
        assert_eq!(config.extraction.cycle_timeout, 60);
        assert!(!config.daemon.enabled);
        assert_eq!(config.daemon.interval, "5m");
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.color);
    }

    #[test]
    #[serial]
    fn test_expand_paths() {
        env::set_var("TEST_TASKMIRROR_HOME", "/test/home");

        let mut config = Config::default();
        config.storage_directory = "${TEST_TASKMIRROR_HOME}/data".to_string();

        config.expand_paths().expect("Failed to expand paths");

        assert_eq!(config.storage_directory, "/test/home/data");

        env::remove_var("TEST_TASKMIRROR_HOME");
    }

    #[test]
    fn test_config_load_nonexistent_file() {
        let nonexistent_path = Path::new("/nonexistent/path/config.yml");
        let result = Config::load(nonexistent_path);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.yml");

        let mut config = Config::default();
        config.storage_directory = "/custom/path".to_string();
        config.asana.workspace = "1200000000000001".to_string();
        config.asana.request_timeout = 10;
        config.daemon.interval = "30s".to_string();

        config.save(&config_path).expect("Failed to save config");

        let loaded_config = Config::load(&config_path).expect("Failed to load config");

        assert_eq!(loaded_config.storage_directory, "/custom/path");
        assert_eq!(loaded_config.asana.workspace, "1200000000000001");
        assert_eq!(loaded_config.asana.request_timeout, 10);
        assert_eq!(loaded_config.daemon.interval, "30s");
    }

    #[test]
    fn test_config_default_path_xdg() {
        let default_path = Config::default_config_path().expect("Failed to get default path");
        assert!(default_path.to_string_lossy().contains("taskmirror"));
        assert!(default_path.to_string_lossy().ends_with("config.yml"));
    }

    #[test]
    #[serial]
    fn test_resolve_token_prefers_config_value() {
        env::set_var(TOKEN_ENV_VAR, "env-token");

        let config = AsanaConfig {
            token: Some("file-token".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolve_token(), Some("file-token".to_string()));

        env::remove_var(TOKEN_ENV_VAR);
    }

    #[test]
    #[serial]
    fn test_resolve_token_falls_back_to_env() {
        env::set_var(TOKEN_ENV_VAR, "env-token");

        let config = AsanaConfig::default();
        assert_eq!(config.resolve_token(), Some("env-token".to_string()));

        env::remove_var(TOKEN_ENV_VAR);
        assert_eq!(config.resolve_token(), None);
    }

    #[test]
    #[serial]
    fn test_resolve_token_ignores_empty_values() {
        env::set_var(TOKEN_ENV_VAR, "");

        let config = AsanaConfig {
            token: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(config.resolve_token(), None);

        env::remove_var(TOKEN_ENV_VAR);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml_content = r#"
storage_directory: "${HOME}/asana-data"
asana:
  workspace: "1200000000000001"
  token: "0/abcdef"
  request_timeout: 15
extraction:
  cycle_timeout: 120
daemon:
  enabled: true
  interval: "1h"
logging:
  level: "debug"
  format: "json"
  color: false
"#;

        let config: Config = serde_yaml::from_str(yaml_content).expect("Failed to parse YAML");

        assert_eq!(config.storage_directory, "${HOME}/asana-data");
        assert_eq!(config.asana.workspace, "1200000000000001");
        assert_eq!(config.asana.token, Some("0/abcdef".to_string()));
        assert_eq!(config.asana.request_timeout, 15);
        assert_eq!(config.extraction.cycle_timeout, 120);
        assert!(config.daemon.enabled);
        assert_eq!(config.daemon.interval, "1h");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert!(!config.logging.color);
    }

    #[test]
    fn test_yaml_parsing_minimal() {
        let yaml_content = r#"
storage_directory: "/var/lib/taskmirror"
asana:
  workspace: "42"
"#;

        let config: Config = serde_yaml::from_str(yaml_content).expect("Failed to parse YAML");

        assert_eq!(config.storage_directory, "/var/lib/taskmirror");
        assert_eq!(config.asana.workspace, "42");
        assert!(config.asana.token.is_none());
        // Unspecified sections fall back to defaults
        assert_eq!(config.extraction.cycle_timeout, 60);
        assert!(!config.daemon.enabled);
    }
}
