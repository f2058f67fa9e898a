use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredCookie {
    url: String,
    set_cookie: String,
}

/// Cookie jar that writes every `Set-Cookie` it sees to disk and replays
/// them on load, so the refresh cookie outlives the process.
pub struct PersistentCookieJar {
    jar: Jar,
    path: PathBuf,
    stored: Mutex<BTreeMap<String, StoredCookie>>,
}

impl PersistentCookieJar {
    /// Open the jar at `path`. An unreadable or corrupt file is logged,
    /// removed and replaced by an empty jar.
    pub fn load(path: PathBuf) -> Self {
        let jar = Jar::default();
        let mut stored = BTreeMap::new();

        match read_cookie_file(&path) {
            Ok(cookies) => {
                for cookie in cookies {
                    let Ok(url) = Url::parse(&cookie.url) else {
                        warn!(url = %cookie.url, "Skipping stored cookie with invalid URL");
                        continue;
                    };
                    jar.add_cookie_str(&cookie.set_cookie, &url);
                    if let Some(name) = cookie_name(&cookie.set_cookie) {
                        stored.insert(name.to_string(), cookie);
                    }
                }
                if !stored.is_empty() {
                    debug!(count = stored.len(), "Cookies restored");
                }
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Discarding unreadable cookie file");
                if let Err(e) = std::fs::remove_file(&path) {
                    warn!(error = %e, "Failed to remove cookie file");
                }
            }
        }

        Self {
            jar,
            path,
            stored: Mutex::new(stored),
        }
    }

    /// Forget all persisted cookies. Cookies already in this process's jar
    /// stay until it exits.
    pub fn clear(&self) -> Result<()> {
        self.stored.lock().unwrap_or_else(PoisonError::into_inner).clear();
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove cookie file")?;
        }
        Ok(())
    }

    fn save(&self, cookies: &BTreeMap<String, StoredCookie>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let list: Vec<&StoredCookie> = cookies.values().collect();
        std::fs::write(&self.path, serde_json::to_string_pretty(&list)?)
            .context("Failed to write cookie file")?;
        Ok(())
    }
}

impl CookieStore for PersistentCookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let headers: Vec<&HeaderValue> = cookie_headers.collect();
        self.jar.set_cookies(&mut headers.iter().copied(), url);

        let mut stored = self.stored.lock().unwrap_or_else(PoisonError::into_inner);
        let mut changed = false;
        for value in headers {
            let Ok(set_cookie) = value.to_str() else {
                continue;
            };
            if let Some(name) = cookie_name(set_cookie) {
                stored.insert(
                    name.to_string(),
                    StoredCookie {
                        url: url.to_string(),
                        set_cookie: set_cookie.to_string(),
                    },
                );
                changed = true;
            }
        }
        if changed {
            if let Err(e) = self.save(&stored) {
                warn!(error = %e, "Failed to persist cookies");
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.jar.cookies(url)
    }
}

fn read_cookie_file(path: &Path) -> Result<Vec<StoredCookie>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = std::fs::read_to_string(path).context("Failed to read cookie file")?;
    serde_json::from_str(&contents).context("Failed to parse cookie file")
}

fn cookie_name(set_cookie: &str) -> Option<&str> {
    let pair = set_cookie.split(';').next()?;
    let name = pair.split('=').next()?.trim();
    (!name.is_empty()).then_some(name)
}
