//! Application configuration management.
//!
//! Holds the service base URL and the cache tuning knobs. Stored at
//! `~/.config/tripcache/config.json`; a missing file means defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::CacheConfig;

/// Application name used for config directory paths
const APP_NAME: &str = "tripcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Overrides `api_base_url` when set
pub const API_URL_ENV: &str = "TRIPCACHE_API_URL";

const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
const DEFAULT_STALE_MINUTES: u64 = 5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    /// Minutes before a cached query counts as stale
    pub stale_minutes: u64,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            stale_minutes: DEFAULT_STALE_MINUTES,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load from the user config directory, then apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Ok(Self::load_from(&path)?.with_env_overrides())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config = serde_json::from_str(&contents)
                .with_context(|| format!("Invalid config file {}", path.display()))?;
            debug!(path = %path.display(), "Loaded config");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_api_url_override(std::env::var(API_URL_ENV).ok())
    }

    fn with_api_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            debug!(url = %url, "API base URL overridden from environment");
            self.api_base_url = url.trim().to_string();
        }
        self
    }

    pub fn cache_config(&self) -> CacheConfig {
        let stale_secs = self.stale_minutes.saturating_mul(60);
        CacheConfig::default().with_stale_time(Duration::from_secs(stale_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://localhost:3000/api");
        assert_eq!(config.cache_config().stale_time, Duration::from_secs(300));
    }

    #[test]
    fn test_huge_stale_minutes_saturates() {
        let config = Config {
            stale_minutes: u64::MAX,
            ..Config::default()
        };
        assert_eq!(config.cache_config().stale_time, Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = Config {
            api_base_url: "https://trips.example.com/api".to_string(),
            stale_minutes: 1,
            request_timeout_secs: 10,
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"stale_minutes": 10}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.stale_minutes, 10);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_api_url_override() {
        let config = Config::default().with_api_url_override(Some(" http://other/api ".into()));
        assert_eq!(config.api_base_url, "http://other/api");

        let config = Config::default().with_api_url_override(Some("  ".into()));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }
}
