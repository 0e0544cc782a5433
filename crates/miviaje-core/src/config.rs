//! Application configuration management.
//!
//! Configuration covers the cache version tag, the precache asset list, the
//! service worker script path and the page defaults. Every component takes
//! these values through its constructor; nothing reads them from globals.
//!
//! Configuration is stored at `~/.config/mi-viaje/config.json`. A missing file
//! yields the built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "mi-viaje";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Current cache generation. Bumping it is the only way to invalidate cached assets.
pub const DEFAULT_CACHE_NAME: &str = "mi-viaje-v1";

/// Path the page registers the service worker from
pub const SERVICE_WORKER_URL: &str = "/static/sw.js";

/// Tab shown when no persisted tab can be restored
pub const DEFAULT_TAB: &str = "gastos";

/// Local development server of the backend
const DEFAULT_ORIGIN: &str = "http://localhost:5000";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Assets stored in the cache when the service worker installs.
pub const PRECACHE_URLS: &[&str] = &[
    "/",
    "/static/css/style.css",
    "/static/js/app.js",
    "/static/manifest.json",
    "/static/icons/icon-192x192.png",
    "/static/icons/icon-512x512.png",
    "https://fonts.googleapis.com/css2?family=Inter:wght@300;400;500;600;700&display=swap",
    "https://fonts.googleapis.com/icon?family=Material+Icons",
];

/// What the page does with queued offline actions once connectivity returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayPolicy {
    /// Log the queue and clear it without sending anything.
    #[default]
    LogAndClear,
    /// Resend actions in order. The first failure and everything after it stay queued.
    Replay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub origin: String,
    pub cache_name: String,
    pub service_worker_url: String,
    pub precache_urls: Vec<String>,
    pub default_tab: String,
    pub replay_policy: ReplayPolicy,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            service_worker_url: SERVICE_WORKER_URL.to_string(),
            precache_urls: PRECACHE_URLS.iter().map(|s| s.to_string()).collect(),
            default_tab: DEFAULT_TAB.to_string(),
            replay_policy: ReplayPolicy::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
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

    /// Directory holding the service worker's cache buckets
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join("buckets"))
    }

    /// File backing the page's local storage
    pub fn local_storage_path(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join("local_storage.json"))
    }

    pub fn origin_url(&self) -> Result<Url> {
        Url::parse(&self.origin).with_context(|| format!("Invalid origin: {}", self.origin))
    }
}
