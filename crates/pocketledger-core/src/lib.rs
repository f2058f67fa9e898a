//! PocketLedger core library.
//!
//! Shared by every PocketLedger front end:
//! - `api`: session-aware client for the expense tracker REST API
//! - `auth`: token storage, login redirect and the signed-in user
//! - `store`: transactions, categories and statistics of that user
//! - `dashboard`: period figures and monthly trends
//! - `validation`: form checks before anything is sent
//! - `cache`: offline copies of the last loaded data
//! - `config`: application configuration

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod store;
pub mod utils;
pub mod validation;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, ApiError, Envelope};
pub use auth::{AuthStore, LoginRedirect, Navigator, TokenStore};
pub use config::Config;
pub use store::DataStore;
