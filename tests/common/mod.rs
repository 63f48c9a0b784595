/// Common test utilities and helpers for taskmirror tests
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test configuration helper
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub storage_dir: PathBuf,
    pub original_env: Vec<(String, Option<String>)>,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let storage_dir = temp_dir.path().join("data");
        std::fs::create_dir_all(&storage_dir).expect("Failed to create storage dir");

        // Store original environment variables
        let env_vars = vec!["ASANA_TOKEN", "XDG_CONFIG_HOME", "HOME"];
        let original_env = env_vars
            .iter()
            .map(|var| (var.to_string(), env::var(var).ok()))
            .collect();

        Self {
            temp_dir,
            storage_dir,
            original_env,
        }
    }

    pub fn create_test_config(&self, content: &str) -> PathBuf {
        let config_path = self.temp_dir.path().join("config.yml");
        std::fs::write(&config_path, content).expect("Failed to write test config");
        config_path
    }

    /// A valid config pointing at this environment's storage directory,
    /// with no token so credential resolution falls through to the env.
    pub fn create_minimal_config(&self) -> PathBuf {
        let config_content = format!(
            r#"
storage_directory: "{}"
asana:
  workspace: "1200000000000001"
daemon:
  interval: "5m"
"#,
            self.storage_dir.display()
        );
        self.create_test_config(&config_content)
    }
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        // Restore original environment variables
        for (key, value) in &self.original_env {
            match value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}
