//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! backend base URL and the last username used to log in.
//!
//! Configuration is stored at `~/.config/diradmin/config.json`; the token
//! file lives under the platform data directory.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "diradmin";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment variable overriding the backend URL
pub const API_URL_ENV: &str = "DIRADMIN_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_url: Option<String>,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted token pair
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Backend URL: environment, then config file, then the default
    pub fn api_url(&self) -> String {
        Self::resolve_api_url(std::env::var(API_URL_ENV).ok(), self.api_url.clone())
    }

    fn resolve_api_url(env: Option<String>, configured: Option<String>) -> String {
        env.filter(|s| !s.trim().is_empty())
            .or(configured.filter(|s| !s.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_precedence() {
        assert_eq!(
            Config::resolve_api_url(Some("https://env.example".into()), Some("https://cfg.example".into())),
            "https://env.example"
        );
        assert_eq!(
            Config::resolve_api_url(Some(" ".into()), Some("https://cfg.example".into())),
            "https://cfg.example"
        );
        assert_eq!(Config::resolve_api_url(None, None), DEFAULT_API_URL);
    }

    #[test]
    fn test_config_tolerates_missing_fields() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert!(config.api_url.is_none());
        assert!(config.last_username.is_none());
    }
}
