//! Configuration commands. These never touch the network.

use anyhow::{Context as _, Result};
use clap::ValueEnum;
use serde_json::json;

use pocketledger_core::auth::TokenBackend;
use pocketledger_core::config::{self as app_config, Config, SERVER_URL_ENV};

use crate::output::{self, OutputFormat};

/// Where the session token is kept.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BackendArg {
    File,
    Keyring,
    Memory,
}

impl From<BackendArg> for TokenBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::File => TokenBackend::File,
            BackendArg::Keyring => TokenBackend::Keyring,
            BackendArg::Memory => TokenBackend::Memory,
        }
    }
}

pub fn config_show(config: &Config, format: &OutputFormat) -> Result<()> {
    let path = Config::config_path()?;
    let cache_dir = config.cache_dir()?;
    let env_override = std::env::var(SERVER_URL_ENV).ok();

    match format {
        OutputFormat::Text => {
            output::print_row("Config file", &path.display().to_string());
            output::print_row("Server", &config.server_url());
            if env_override.is_some() {
                output::print_row("", &format!("(from {})", SERVER_URL_ENV));
            }
            output::print_row("Token storage", &format!("{:?}", config.token_backend).to_lowercase());
            output::print_row("Timeout", &format!("{}s", config.request_timeout().as_secs()));
            output::print_row("Cache dir", &cache_dir.display().to_string());
            output::print_row("Log to file", if config.log_to_file { "yes" } else { "no" });
        }
        OutputFormat::Json => output::print_json(&json!({
            "path": path,
            "server_url": config.server_url(),
            "token_backend": config.token_backend,
            "request_timeout_secs": config.request_timeout().as_secs(),
            "cache_dir": cache_dir,
            "last_email": config.last_email,
            "log_to_file": config.log_to_file,
        }))?,
    }
    Ok(())
}

pub fn config_set_server(config: &mut Config, url: &str, format: &OutputFormat) -> Result<()> {
    let url = app_config::check_server_url(url)?;
    config.server_url = Some(url.clone());
    config.save().context("Failed to save config")?;
    output::print_success(&format!("Server set to {}", url), format);
    Ok(())
}

pub fn config_set_backend(config: &mut Config, backend: BackendArg, format: &OutputFormat) -> Result<()> {
    config.token_backend = backend.into();
    config.save().context("Failed to save config")?;
    output::print_success(
        "Token storage changed. Run 'pocketledger login' to store a session there.",
        format,
    );
    Ok(())
}
