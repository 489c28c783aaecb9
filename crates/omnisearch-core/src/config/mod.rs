//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Omnisearch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub suggestions: SuggestionConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Page size used when the caller does not supply one
    pub default_limit: i64,
    /// Minimum number of rows requested from each domain store
    pub max_results_per_domain: u32,
    /// Upper bound for a single domain lookup before it is dropped from the merge
    pub domain_timeout_ms: u64,
    /// Characters kept on either side of the first match in `SearchResult::context`
    pub context_radius: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    pub min_prefix_len: usize,
    pub history_limit: u32,
    pub channel_limit: u32,
    pub user_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file; `None` means the platform default
    pub database_path: Option<PathBuf>,
    pub max_connections: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_results_per_domain: 100,
            domain_timeout_ms: 5_000,
            context_radius: 50,
        }
    }
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            min_prefix_len: 2,
            history_limit: 5,
            channel_limit: 3,
            user_limit: 3,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            max_connections: 5,
        }
    }
}

impl SearchConfig {
    pub fn domain_timeout(&self) -> Duration {
        Duration::from_millis(self.domain_timeout_ms)
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("OMNISEARCH_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("omnisearch")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or return defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| -> Result<()> { Err(Error::ConfigError(message.to_string())) };

        if self.search.default_limit < 0 {
            return invalid("search.default_limit must be non-negative");
        }
        if self.search.domain_timeout_ms == 0 {
            return invalid("search.domain_timeout_ms must be greater than zero");
        }
        if self.suggestions.min_prefix_len == 0 {
            return invalid("suggestions.min_prefix_len must be at least 1");
        }
        if self.storage.max_connections == 0 {
            return invalid("storage.max_connections must be at least 1");
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "search.default_limit" => Ok(self.search.default_limit.to_string()),
            "search.max_results_per_domain" => Ok(self.search.max_results_per_domain.to_string()),
            "search.domain_timeout_ms" => Ok(self.search.domain_timeout_ms.to_string()),
            "search.context_radius" => Ok(self.search.context_radius.to_string()),

            "suggestions.min_prefix_len" => Ok(self.suggestions.min_prefix_len.to_string()),
            "suggestions.history_limit" => Ok(self.suggestions.history_limit.to_string()),
            "suggestions.channel_limit" => Ok(self.suggestions.channel_limit.to_string()),
            "suggestions.user_limit" => Ok(self.suggestions.user_limit.to_string()),

            "storage.database_path" => Ok(self
                .storage
                .database_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(default)".to_string())),
            "storage.max_connections" => Ok(self.storage.max_connections.to_string()),

            _ => Err(anyhow!("Unknown configuration key: {}", key)),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "search.default_limit" => {
                let limit: i64 = value
                    .parse()
                    .with_context(|| format!("Invalid default_limit value: {}", value))?;
                if limit < 0 {
                    return Err(anyhow!("Default limit must be non-negative"));
                }
                self.search.default_limit = limit;
            }
            "search.max_results_per_domain" => {
                self.search.max_results_per_domain = value
                    .parse()
                    .with_context(|| format!("Invalid max_results_per_domain value: {}", value))?;
            }
            "search.domain_timeout_ms" => {
                let timeout: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid domain_timeout_ms value: {}", value))?;
                if timeout == 0 {
                    return Err(anyhow!("Domain timeout must be greater than zero"));
                }
                self.search.domain_timeout_ms = timeout;
            }
            "search.context_radius" => {
                self.search.context_radius = value
                    .parse()
                    .with_context(|| format!("Invalid context_radius value: {}", value))?;
            }
            "suggestions.min_prefix_len" => {
                let len: usize = value
                    .parse()
                    .with_context(|| format!("Invalid min_prefix_len value: {}", value))?;
                if len == 0 {
                    return Err(anyhow!("Minimum prefix length must be at least 1"));
                }
                self.suggestions.min_prefix_len = len;
            }
            "suggestions.history_limit" => {
                self.suggestions.history_limit = value
                    .parse()
                    .with_context(|| format!("Invalid history_limit value: {}", value))?;
            }
            "suggestions.channel_limit" => {
                self.suggestions.channel_limit = value
                    .parse()
                    .with_context(|| format!("Invalid channel_limit value: {}", value))?;
            }
            "suggestions.user_limit" => {
                self.suggestions.user_limit = value
                    .parse()
                    .with_context(|| format!("Invalid user_limit value: {}", value))?;
            }
            "storage.database_path" => {
                self.storage.database_path = Some(PathBuf::from(value));
            }
            "storage.max_connections" => {
                let max: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid max_connections value: {}", value))?;
                if max == 0 {
                    return Err(anyhow!("Connection pool needs at least one connection"));
                }
                self.storage.max_connections = max;
            }
            _ => {
                return Err(anyhow!("Unknown configuration key: {}", key));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = vec![
            "search.default_limit",
            "search.max_results_per_domain",
            "search.domain_timeout_ms",
            "search.context_radius",
            "suggestions.min_prefix_len",
            "suggestions.history_limit",
            "suggestions.channel_limit",
            "suggestions.user_limit",
            "storage.database_path",
            "storage.max_connections",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
