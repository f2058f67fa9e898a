//! CLI command implementations.

mod auth;
mod categories;
mod config;
mod dashboard;
mod transactions;

pub use auth::{forgot_password, login, logout, register, status, whoami};
pub use categories::{categories_add, categories_delete, categories_edit, categories_list};
pub use config::{config_set_backend, config_set_server, config_show, BackendArg};
pub use dashboard::{breakdown, dashboard, resolve_filters, stats};
pub use transactions::{
    transactions_add, transactions_delete, transactions_edit, transactions_list, transactions_show,
    TransactionArgs,
};

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use pocketledger_core::cache::CacheManager;
use pocketledger_core::{ApiClient, AuthStore, Config, DataStore, LoginRedirect};

use crate::output::{self, OutputFormat};

/// Everything a command needs: configuration, the shared API client and the
/// login redirect it reports a lost session to.
pub struct Context {
    pub config: Config,
    pub client: Arc<ApiClient>,
    pub redirect: Arc<LoginRedirect>,
    pub format: OutputFormat,
}

impl Context {
    pub fn new(config: Config, format: OutputFormat) -> Result<Self> {
        let redirect = Arc::new(LoginRedirect::default());
        let client = Arc::new(ApiClient::from_config(&config, redirect.clone())?);
        Ok(Self {
            config,
            client,
            redirect,
            format,
        })
    }

    pub fn auth_store(&self) -> AuthStore {
        AuthStore::new(self.client.clone())
    }

    /// Data store snapshotting into the offline cache when it can be opened
    pub fn data_store(&self) -> DataStore {
        let store = DataStore::new(self.client.clone());
        match self.config.cache_dir().and_then(CacheManager::new) {
            Ok(cache) => store.with_cache(cache),
            Err(e) => {
                warn!(error = %e, "Offline cache unavailable");
                store
            }
        }
    }

    /// Fail early when there is no session to use
    pub fn require_login(&self) -> Result<()> {
        if !self.client.has_token() {
            anyhow::bail!("Not logged in. Run 'pocketledger login' first.");
        }
        Ok(())
    }

    /// Tell the user when the server ended their session during the command
    pub fn report_session_end(&self) {
        if self.redirect.take_pending() {
            output::print_notice("Your session has expired. Run 'pocketledger login' to sign in again.");
        }
    }
}

/// Prompt for a line of input, offering `default` when given.
fn prompt(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(default) => print!("{} [{}]: ", label, default),
        None => print!("{}: ", label),
    }
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let line = line.trim();
    if line.is_empty() {
        Ok(default.unwrap_or_default().to_string())
    } else {
        Ok(line.to_string())
    }
}

/// Ask before something destructive; `--yes` skips the question.
fn confirm(question: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    let answer = prompt(&format!("{} (y/N)", question), None)?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}
