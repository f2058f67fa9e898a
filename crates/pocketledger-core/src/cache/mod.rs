//! Local caching module for offline data access.
//!
//! `CacheManager` keeps the last transactions, categories and statistics
//! loaded from the server as JSON files in the cache directory. Cached data
//! is considered stale after 60 minutes.

pub mod manager;

pub use manager::{CacheAges, CacheManager, CachedData};
