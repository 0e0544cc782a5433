use std::sync::Arc;

use futures::future::try_join_all;
use miviaje_core::{Config, FetchError, Method, Network, Request, Response, ResponseType};
use tracing::{debug, info, warn};
use url::Url;

use super::storage::CacheStorage;
use crate::error::CacheError;

/// Settings the worker needs, extracted from the app `Config`.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    /// Current version tag; the only bucket that survives activation
    pub cache_name: String,
    pub origin: Url,
    pub precache_urls: Vec<String>,
}

impl WorkerConfig {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            cache_name: config.cache_name.clone(),
            origin: config.origin_url()?,
            precache_urls: config.precache_urls.clone(),
        })
    }
}

/// Where an intercepted response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub response: Response,
    pub source: ResponseSource,
}

/// Cache-first asset cache for one version tag.
/// Clone is cheap - storage and network are shared.
#[derive(Clone)]
pub struct CacheManager {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    config: WorkerConfig,
}

impl CacheManager {
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            storage,
            network,
            config,
        }
    }

    pub fn cache_name(&self) -> &str {
        &self.config.cache_name
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Populate the current bucket with every precache URL.
    ///
    /// All assets are fetched before anything is written, so a single failed
    /// or non-2xx fetch aborts the install and leaves the bucket untouched.
    /// Returns the number of stored entries.
    pub async fn install(&self) -> Result<usize, CacheError> {
        let name = &self.config.cache_name;
        self.storage.open(name).await?;
        info!(cache = %name, "Cache opened");

        let requests = self
            .config
            .precache_urls
            .iter()
            .map(|url| {
                Request::resolve(&self.config.origin, url)
                    .map_err(|e| CacheError::InvalidUrl(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let fetches = requests.iter().map(|request| async move {
            let url = request.url.to_string();
            let response = self
                .network
                .fetch(request)
                .await
                .map_err(|source| CacheError::Precache {
                    url: url.clone(),
                    source,
                })?;
            if !response.ok() {
                return Err(CacheError::Precache {
                    url: url.clone(),
                    source: FetchError::BadStatus {
                        status: response.status,
                        url,
                    },
                });
            }
            Ok((request.cache_key(), response))
        });

        let entries = try_join_all(fetches).await?;
        let count = entries.len();
        self.storage.put_all(name, entries).await?;

        info!(cache = %name, entries = count, "Precache complete");
        Ok(count)
    }

    /// Delete every bucket except the current one. Returns the evicted names.
    pub async fn activate(&self) -> Result<Vec<String>, CacheError> {
        let mut evicted = Vec::new();
        for name in self.storage.keys().await? {
            if name != self.config.cache_name {
                info!(cache = %name, "Deleting old cache");
                self.storage.delete(&name).await?;
                evicted.push(name);
            }
        }
        Ok(evicted)
    }

    /// Cache-first interception.
    ///
    /// A hit is returned as stored, without touching the network. A miss goes
    /// to the network; a 200 `basic` response is stored before being returned.
    /// Any other response is passed through uncached. Network failures
    /// propagate to the caller.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome, FetchError> {
        if request.method != Method::Get {
            // The platform cache only keys GET requests
            let response = self.network.fetch(request).await?;
            return Ok(FetchOutcome {
                response,
                source: ResponseSource::Network,
            });
        }

        let key = request.cache_key();
        match self.storage.lookup(&self.config.cache_name, &key).await {
            Ok(Some(response)) => {
                debug!(url = %request.url, "Cache hit");
                return Ok(FetchOutcome {
                    response,
                    source: ResponseSource::Cache,
                });
            }
            Ok(None) => {}
            Err(e) => warn!(url = %request.url, error = %e, "Cache lookup failed, using network"),
        }

        let response = self.network.fetch(request).await?;
        if Self::is_cacheable(&response) {
            if let Err(e) = self
                .storage
                .put(&self.config.cache_name, key, response.clone())
                .await
            {
                warn!(url = %request.url, error = %e, "Failed to cache response");
            }
        } else {
            debug!(
                url = %request.url,
                status = response.status,
                response_type = ?response.response_type,
                "Response not cacheable"
            );
        }

        Ok(FetchOutcome {
            response,
            source: ResponseSource::Network,
        })
    }

    fn is_cacheable(response: &Response) -> bool {
        response.status == 200 && response.response_type == ResponseType::Basic
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::cache::MemoryCacheStorage;

    /// Network fake answering from a fixed route table and counting calls.
    #[derive(Default)]
    pub(crate) struct FakeNetwork {
        routes: Mutex<HashMap<String, Response>>,
        calls: AtomicUsize,
    }

    impl FakeNetwork {
        pub(crate) fn route(&self, url: &str, response: Response) {
            self.routes
                .lock()
                .unwrap()
                .insert(url.to_string(), response);
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Network for FakeNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.routes
                .lock()
                .unwrap()
                .get(request.url.as_str())
                .cloned()
                .ok_or_else(|| FetchError::Unreachable(request.url.to_string()))
        }
    }

    pub(crate) const ORIGIN: &str = "http://localhost:5000";

    pub(crate) fn config(cache_name: &str) -> WorkerConfig {
        WorkerConfig {
            cache_name: cache_name.to_string(),
            origin: Url::parse(ORIGIN).unwrap(),
            precache_urls: vec![
                "/".to_string(),
                "/static/js/app.js".to_string(),
                "https://fonts.googleapis.com/icon?family=Material+Icons".to_string(),
            ],
        }
    }

    pub(crate) fn basic(url: &str, body: &str) -> Response {
        Response::new(200, ResponseType::Basic, url).with_body(body)
    }

    /// Network serving every precache URL of `config`.
    pub(crate) fn precache_network() -> Arc<FakeNetwork> {
        let network = Arc::new(FakeNetwork::default());
        network.route("http://localhost:5000/", basic("http://localhost:5000/", "<html>"));
        network.route(
            "http://localhost:5000/static/js/app.js",
            basic("http://localhost:5000/static/js/app.js", "js"),
        );
        network.route(
            "https://fonts.googleapis.com/icon?family=Material+Icons",
            Response::new(200, ResponseType::Cors, "https://fonts.googleapis.com/icon")
                .with_body("@font-face {}"),
        );
        network
    }

    fn request(path: &str) -> Request {
        Request::resolve(&Url::parse(ORIGIN).unwrap(), path).unwrap()
    }

    #[tokio::test]
    async fn test_install_populates_current_bucket() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let manager = CacheManager::new(storage.clone(), precache_network(), config("mi-viaje-v1"));

        assert_eq!(manager.install().await.unwrap(), 3);
        assert_eq!(storage.keys().await.unwrap(), vec!["mi-viaje-v1"]);
        assert_eq!(storage.entry_keys("mi-viaje-v1").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_install_twice_is_idempotent() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let network = precache_network();
        let first = CacheManager::new(storage.clone(), network.clone(), config("mi-viaje-v1"));
        let second = CacheManager::new(storage.clone(), network, config("mi-viaje-v1"));

        first.install().await.unwrap();
        second.install().await.unwrap();

        assert_eq!(storage.keys().await.unwrap(), vec!["mi-viaje-v1"]);
        let mut keys = storage.entry_keys("mi-viaje-v1").await.unwrap();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "GET http://localhost:5000/",
                "GET http://localhost:5000/static/js/app.js",
                "GET https://fonts.googleapis.com/icon?family=Material+Icons",
            ]
        );
    }

    #[tokio::test]
    async fn test_install_is_all_or_nothing() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let network = precache_network();
        network.route(
            "http://localhost:5000/static/js/app.js",
            Response::new(404, ResponseType::Basic, "http://localhost:5000/static/js/app.js"),
        );
        let manager = CacheManager::new(storage.clone(), network, config("mi-viaje-v1"));

        let err = manager.install().await.unwrap_err();
        assert!(matches!(err, CacheError::Precache { .. }));
        assert!(storage.entry_keys("mi-viaje-v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_install_aborts_on_network_failure() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let network = Arc::new(FakeNetwork::default());
        network.route("http://localhost:5000/", basic("http://localhost:5000/", "<html>"));
        let manager = CacheManager::new(storage.clone(), network, config("mi-viaje-v1"));

        assert!(manager.install().await.is_err());
        assert!(storage.entry_keys("mi-viaje-v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_activate_evicts_other_buckets() {
        let storage = Arc::new(MemoryCacheStorage::new());
        storage.open("mi-viaje-v0").await.unwrap();
        storage.open("otra-app").await.unwrap();
        let manager = CacheManager::new(storage.clone(), precache_network(), config("mi-viaje-v1"));
        manager.install().await.unwrap();

        let mut evicted = manager.activate().await.unwrap();
        evicted.sort();
        assert_eq!(evicted, vec!["mi-viaje-v0", "otra-app"]);
        assert_eq!(storage.keys().await.unwrap(), vec!["mi-viaje-v1"]);
    }

    #[tokio::test]
    async fn test_activate_without_install_leaves_nothing() {
        let storage = Arc::new(MemoryCacheStorage::new());
        storage.open("mi-viaje-v0").await.unwrap();
        let manager = CacheManager::new(storage.clone(), precache_network(), config("mi-viaje-v1"));

        manager.activate().await.unwrap();
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let network = precache_network();
        let manager = CacheManager::new(storage, network.clone(), config("mi-viaje-v1"));
        manager.install().await.unwrap();
        let calls_after_install = network.calls();

        // Upstream changes are never seen while the entry is cached
        network.route(
            "http://localhost:5000/static/js/app.js",
            basic("http://localhost:5000/static/js/app.js", "js v2"),
        );
        let outcome = manager.handle_fetch(&request("/static/js/app.js")).await.unwrap();

        assert_eq!(outcome.source, ResponseSource::Cache);
        assert_eq!(outcome.response.text(), "js");
        assert_eq!(network.calls(), calls_after_install);
    }

    #[tokio::test]
    async fn test_cache_miss_populates_bucket() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let network = Arc::new(FakeNetwork::default());
        network.route(
            "http://localhost:5000/viaje/1",
            basic("http://localhost:5000/viaje/1", "viaje"),
        );
        let manager = CacheManager::new(storage, network.clone(), config("mi-viaje-v1"));

        let first = manager.handle_fetch(&request("/viaje/1")).await.unwrap();
        assert_eq!(first.source, ResponseSource::Network);

        let second = manager.handle_fetch(&request("/viaje/1")).await.unwrap();
        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(second.response.text(), "viaje");
        assert_eq!(network.calls(), 1);
    }

    #[tokio::test]
    async fn test_non_qualifying_responses_not_cached() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let network = Arc::new(FakeNetwork::default());
        network.route(
            "http://localhost:5000/missing",
            Response::new(404, ResponseType::Basic, "http://localhost:5000/missing"),
        );
        network.route(
            "http://localhost:5000/created",
            Response::new(201, ResponseType::Basic, "http://localhost:5000/created"),
        );
        network.route(
            "https://cdn.example.com/lib.js",
            Response::new(200, ResponseType::Cors, "https://cdn.example.com/lib.js"),
        );
        network.route("https://cdn.example.com/pixel.gif", Response::opaque());
        let manager = CacheManager::new(storage.clone(), network.clone(), config("mi-viaje-v1"));

        for path in [
            "/missing",
            "/created",
            "https://cdn.example.com/lib.js",
            "https://cdn.example.com/pixel.gif",
        ] {
            let outcome = manager.handle_fetch(&request(path)).await.unwrap();
            assert_eq!(outcome.source, ResponseSource::Network);
        }

        assert!(storage.entry_keys("mi-viaje-v1").await.unwrap().is_empty());
        assert_eq!(network.calls(), 4);
    }

    #[tokio::test]
    async fn test_network_failure_without_cache_propagates() {
        let manager = CacheManager::new(
            Arc::new(MemoryCacheStorage::new()),
            Arc::new(FakeNetwork::default()),
            config("mi-viaje-v1"),
        );

        let err = manager.handle_fetch(&request("/offline")).await.unwrap_err();
        assert!(err.is_network_failure());
    }

    #[tokio::test]
    async fn test_non_get_bypasses_cache() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let network = Arc::new(FakeNetwork::default());
        network.route(
            "http://localhost:5000/api/gastos",
            basic("http://localhost:5000/api/gastos", "{}"),
        );
        let manager = CacheManager::new(storage.clone(), network.clone(), config("mi-viaje-v1"));

        let post = Request::new(Method::Post, Url::parse("http://localhost:5000/api/gastos").unwrap());
        manager.handle_fetch(&post).await.unwrap();
        manager.handle_fetch(&post).await.unwrap();

        assert_eq!(network.calls(), 2);
        assert!(storage.entry_keys("mi-viaje-v1").await.unwrap().is_empty());
    }

    #[test]
    fn test_worker_config_from_config() {
        let config = WorkerConfig::from_config(&Config::default()).unwrap();
        assert_eq!(config.cache_name, "mi-viaje-v1");
        assert_eq!(config.origin.as_str(), "http://localhost:5000/");
        assert_eq!(config.precache_urls.len(), 8);
    }
}
