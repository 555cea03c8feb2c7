//! Configuration loading.
//!
//! Reads an optional `config.toml`, then applies environment overrides.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimeflowError};
use crate::storage::{data_dir, default_state_path};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Where the state file lives
    #[serde(default)]
    pub storage: StorageConfig,

    /// Estimate advisor endpoint
    #[serde(default)]
    pub advisor: AdvisorConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Explicit state file; defaults to the data directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model name sent with each request
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl AdvisorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reads the API key from the configured variable, if set.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.trim().is_empty())
    }
}

impl Config {
    /// Loads configuration from `$TIMEFLOW_CONFIG` or the data directory.
    ///
    /// A missing file is not an error; a file that does not parse is.
    pub fn load() -> Result<Self> {
        let path = std::env::var("TIMEFLOW_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir().join("config.toml"));
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TimeflowError::Configuration {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::parse(&content).map_err(|e| TimeflowError::Configuration {
            message: format!("{}: {}", path.display(), e),
        })
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("TIMEFLOW_DB") {
            self.storage.path = Some(PathBuf::from(path));
        }
        if let Ok(endpoint) = std::env::var("TIMEFLOW_AI_ENDPOINT") {
            self.advisor.endpoint = endpoint;
        }
        if let Ok(model) = std::env::var("TIMEFLOW_AI_MODEL") {
            self.advisor.model = model;
        }
    }

    /// The state file this configuration points at.
    pub fn state_path(&self) -> PathBuf {
        self.storage.path.clone().unwrap_or_else(default_state_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.advisor.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [storage]
            path = "/tmp/state.json"

            [advisor]
            model = "local-model"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.path, Some(PathBuf::from("/tmp/state.json")));
        assert_eq!(config.advisor.model, "local-model");
        assert_eq!(config.advisor.endpoint, default_endpoint());
        assert_eq!(config.state_path(), PathBuf::from("/tmp/state.json"));
    }

    #[test]
    fn malformed_file_is_rejected() {
        assert!(Config::parse("[advisor\nmodel = 1").is_err());
    }
}
