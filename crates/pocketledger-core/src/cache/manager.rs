use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{Category, Statistics, Transaction};

/// Consider cache stale after 1 hour.
const CACHE_STALE_MINUTES: i64 = 60;

const TRANSACTIONS: &str = "transactions";
const CATEGORIES: &str = "categories";
const STATISTICS: &str = "statistics";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;
        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    fn save<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(self.cache_path(name), contents)
            .with_context(|| format!("Failed to write cache file: {}", name))?;
        debug!(cache = name, "Cache saved");
        Ok(())
    }

    pub fn load_transactions(&self) -> Result<Option<CachedData<Vec<Transaction>>>> {
        self.load(TRANSACTIONS)
    }

    pub fn save_transactions(&self, transactions: &[Transaction]) -> Result<()> {
        self.save(TRANSACTIONS, transactions)
    }

    pub fn load_categories(&self) -> Result<Option<CachedData<Vec<Category>>>> {
        self.load(CATEGORIES)
    }

    pub fn save_categories(&self, categories: &[Category]) -> Result<()> {
        self.save(CATEGORIES, categories)
    }

    pub fn load_statistics(&self) -> Result<Option<CachedData<Statistics>>> {
        self.load(STATISTICS)
    }

    pub fn save_statistics(&self, statistics: &Statistics) -> Result<()> {
        self.save(STATISTICS, statistics)
    }

    /// Remove every cache file, e.g. when the user logs out.
    pub fn clear(&self) -> Result<()> {
        for name in [TRANSACTIONS, CATEGORIES, STATISTICS] {
            let path = self.cache_path(name);
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove cache file: {}", name))?;
            }
        }
        Ok(())
    }

    /// Helper to load cache and log errors without failing
    fn load_age<T>(&self, name: &str, loader: impl FnOnce() -> Result<Option<CachedData<T>>>) -> Option<String> {
        match loader() {
            Ok(Some(cached)) => Some(cached.age_display()),
            Ok(None) => None,
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to load cache for age display");
                None
            }
        }
    }

    pub fn get_cache_ages(&self) -> CacheAges {
        CacheAges {
            transactions: self.load_age(TRANSACTIONS, || self.load_transactions()),
            categories: self.load_age(CATEGORIES, || self.load_categories()),
            statistics: self.load_age(STATISTICS, || self.load_statistics()),
        }
    }

    fn is_cache_stale<T>(&self, name: &str, loader: impl FnOnce() -> Result<Option<CachedData<T>>>) -> bool {
        match loader() {
            Ok(Some(cached)) => cached.is_stale(),
            Ok(None) => true,
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to load cache for staleness check");
                true
            }
        }
    }

    /// Missing or unreadable caches count as stale
    pub fn any_stale(&self) -> bool {
        [
            self.is_cache_stale(TRANSACTIONS, || self.load_transactions()),
            self.is_cache_stale(CATEGORIES, || self.load_categories()),
            self.is_cache_stale(STATISTICS, || self.load_statistics()),
        ]
        .into_iter()
        .any(|stale| stale)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheAges {
    pub transactions: Option<String>,
    pub categories: Option<String>,
    pub statistics: Option<String>,
}

impl CacheAges {
    /// First available age, or "never"
    pub fn last_updated(&self) -> String {
        [&self.transactions, &self.statistics, &self.categories]
            .into_iter()
            .flatten()
            .next()
            .cloned()
            .unwrap_or_else(|| "never".to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
