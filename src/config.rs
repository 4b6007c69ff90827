//! Configuration management with YAML support

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding `backend.base_url`
pub const API_URL_ENV: &str = "T2SQL_API_URL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub queries: QueryConfig,

    #[serde(default)]
    pub suggestions: SuggestionConfig,
}

/// Local key-value store location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: String,
}

/// Text-to-SQL backend endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Query tab behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Keep query tabs across restarts
    #[serde(default = "default_enabled")]
    pub persist: bool,
}

/// Inline suggestion popover
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionConfig {
    #[serde(default = "default_popover_width")]
    pub popover_width: f32,
}

// Default value functions
fn default_storage_path() -> String {
    "~/.local/share/t2sql/t2sql.db".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_enabled() -> bool {
    true
}

fn default_popover_width() -> f32 {
    300.0
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            persist: default_enabled(),
        }
    }
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            popover_width: default_popover_width(),
        }
    }
}

impl BackendConfig {
    /// `base_url` joined with `api_prefix`, without a trailing slash
    pub fn endpoint_base(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let prefix = self.api_prefix.trim_matches('/');
        if prefix.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, prefix)
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    /// Searches in order:
    /// 1. Provided path
    /// 2. ./t2sql.yaml (current directory)
    /// 3. ~/.config/t2sql/t2sql.yaml
    ///
    /// `T2SQL_API_URL` overrides the backend base URL afterwards.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.backend.base_url = url;
            }
        }
        Ok(config)
    }

    fn load_file(path: &str) -> Result<Self> {
        let search_paths = vec![
            shellexpand::tilde(path).to_string(),
            "t2sql.yaml".to_string(),
            shellexpand::tilde("~/.config/t2sql/t2sql.yaml").to_string(),
        ];

        for search_path in &search_paths {
            if std::path::Path::new(search_path).exists() {
                let content = std::fs::read_to_string(search_path)?;
                let config: Config = serde_yaml::from_str(&content)?;
                return Ok(config);
            }
        }

        // No config file found, use defaults
        Ok(Config::default())
    }

    /// Get the storage path, expanding ~ to home directory
    pub fn storage_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.storage.path).to_string();
        PathBuf::from(expanded)
    }
}
