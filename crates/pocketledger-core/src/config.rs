//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the API server URL, where the session token is kept, the request timeout
//! and the last email used to sign in.
//!
//! Configuration is stored at `~/.config/pocketledger/config.json`.
//! Sessions, cookies, cached data and logs live in the cache directory.
//! `POCKETLEDGER_SERVER_URL` overrides the configured server.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::auth::TokenBackend;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "pocketledger";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Server used when nothing is configured
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Environment variable overriding the server URL
pub const SERVER_URL_ENV: &str = "POCKETLEDGER_SERVER_URL";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub token_backend: TokenBackend,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub last_email: Option<String>,
    /// Overrides the platform cache directory
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Also write logs to a daily file under the cache directory
    #[serde(default)]
    pub log_to_file: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
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

    /// Server URL: environment, then config file, then default
    pub fn server_url(&self) -> String {
        self.server_url_with(std::env::var(SERVER_URL_ENV).ok())
    }

    fn server_url_with(&self, env_override: Option<String>) -> String {
        env_override
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.server_url.clone())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join("logs"))
    }
}

/// Check a server URL before it is saved: it must parse, use http or
/// https, and name a host. Returns the URL without a trailing slash.
pub fn check_server_url(url: &str) -> Result<String> {
    let url = url.trim().trim_end_matches('/');
    let parsed = Url::parse(url).with_context(|| format!("Invalid server URL '{}'", url))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("Server URL must start with http:// or https://");
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        anyhow::bail!("Server URL needs a host");
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server_url_with(None), DEFAULT_SERVER_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.token_backend, TokenBackend::File);
    }

    #[test]
    fn test_server_url_precedence() {
        let config = Config {
            server_url: Some("https://ledger.example.com".to_string()),
            ..Config::default()
        };
        assert_eq!(config.server_url_with(None), "https://ledger.example.com");
        assert_eq!(
            config.server_url_with(Some("http://127.0.0.1:8080".to_string())),
            "http://127.0.0.1:8080"
        );
        assert_eq!(config.server_url_with(Some(" ".to_string())), "https://ledger.example.com");
    }

    #[test]
    fn test_zero_timeout_falls_back() {
        let config = Config {
            request_timeout_secs: Some(0),
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("pocketledger").join(CONFIG_FILE);
        assert_eq!(Config::load_from(&path).expect("missing file"), Config::default());

        let config = Config {
            server_url: Some("https://ledger.example.com".to_string()),
            token_backend: TokenBackend::Keyring,
            request_timeout_secs: Some(10),
            last_email: Some("ana@example.com".to_string()),
            cache_dir: Some(dir.path().join("cache")),
            log_to_file: true,
        };
        config.save_to(&path).expect("save config");
        assert_eq!(Config::load_from(&path).expect("load config"), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"last_email": "ana@example.com"}"#).expect("write");
        let config = Config::load_from(&path).expect("load config");
        assert_eq!(config.last_email.as_deref(), Some("ana@example.com"));
        assert_eq!(config.token_backend, TokenBackend::File);
    }

    #[test]
    fn test_check_server_url() {
        assert_eq!(
            check_server_url(" https://api.example.com/ ").expect("valid URL"),
            "https://api.example.com"
        );
        assert!(check_server_url("http://localhost:5000").is_ok());
        assert!(check_server_url("http://[::1]:5000").is_ok());

        for bad in [
            "ftp://example.com",
            "example.com",
            "http://",
            "http://exa mple.com",
            "http://host:99999",
            "https://[::1",
        ] {
            assert!(check_server_url(bad).is_err(), "{} should be rejected", bad);
        }
    }
}
