//! Authentication and session capabilities.
//!
//! This module provides:
//! - `TokenStore`: where the access token is persisted (file, keychain, memory)
//! - `Navigator`: what happens when the session cannot be recovered
//! - `PersistentCookieJar`: keeps the refresh cookie across runs
//! - `AuthStore`: the signed-in user on top of the API client

pub mod cookies;
pub mod navigator;
pub mod store;
pub mod token_store;

pub use cookies::PersistentCookieJar;
pub use navigator::{LoginRedirect, Navigator, LOGIN_ROUTE};
pub use store::AuthStore;
pub use token_store::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenBackend, TokenStore, TOKEN_KEY};
