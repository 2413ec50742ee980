// Server configuration: TOML file, then environment overrides

use anyhow::{bail, Context, Result};
use bexio_sdk::{BexioClient, RetryConfig, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_API_TOKEN: &str = "BEXIO_API_TOKEN";
pub const ENV_BASE_URL: &str = "BEXIO_BASE_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Personal access token; usually supplied through the environment.
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_log_filter() -> String {
    "bexio_mcp=info,bexio_sdk=info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl McpConfig {
    /// Load the file if it exists, then apply process environment overrides.
    pub fn load(config_path: &Path) -> Result<Self> {
        let mut config = Self::from_file(config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "Configuration file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read configuration file {}", config_path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file {}", config_path.display()))
    }

    /// Non-empty values from `lookup` replace the file's settings.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(token) = non_empty(ENV_API_TOKEN) {
            self.api.token = Some(token);
        }
        if let Some(base_url) = non_empty(ENV_BASE_URL) {
            self.api.base_url = base_url;
        }
    }

    pub fn token(&self) -> Result<&str> {
        match self.api.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => bail!(
                "No API token configured; set {} or api.token in the configuration file",
                ENV_API_TOKEN
            ),
        }
    }

    pub fn build_client(&self) -> Result<BexioClient> {
        BexioClient::builder()
            .base_url(self.api.base_url.clone())
            .api_token(self.token()?)
            .timeout(Duration::from_secs(self.api.timeout_secs))
            .retry_config(RetryConfig {
                max_retries: self.api.max_retries,
                ..RetryConfig::default()
            })
            .build()
            .context("Failed to create Bexio client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = McpConfig::from_file(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.api.max_retries, 2);
        assert_eq!(config.logging.filter, "bexio_mcp=info,bexio_sdk=info");
        assert!(config.token().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\ntimeout_secs = 5\ntoken = \"file-token\"").unwrap();

        let config = McpConfig::from_file(file.path()).unwrap();

        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.api.max_retries, 2);
        assert_eq!(config.token().unwrap(), "file-token");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api\ntimeout_secs = ").unwrap();

        let err = McpConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse configuration file"));
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut config = McpConfig::default();
        config.api.token = Some("file-token".to_string());

        config.apply_overrides(env(&[
            (ENV_API_TOKEN, "env-token"),
            (ENV_BASE_URL, "http://localhost:9000/"),
        ]));

        assert_eq!(config.token().unwrap(), "env-token");
        assert_eq!(config.api.base_url, "http://localhost:9000/");
    }

    #[test]
    fn test_blank_environment_values_are_ignored() {
        let mut config = McpConfig::default();
        config.apply_overrides(env(&[(ENV_API_TOKEN, "  ")]));

        assert!(config.token().is_err());
        assert!(config.build_client().is_err());
    }
}
