use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miviaje_core::Response;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::CacheError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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
}

/// Entries of one bucket, keyed by request identity.
pub type Bucket = BTreeMap<String, CachedData<Response>>;

/// Named cache buckets, the worker's equivalent of the platform cache storage.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the bucket if it doesn't exist yet.
    async fn open(&self, name: &str) -> Result<(), CacheError>;

    /// Names of all existing buckets.
    async fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// Delete a bucket. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool, CacheError>;

    /// Look up one request in one bucket. A missing bucket is a miss.
    async fn lookup(&self, name: &str, key: &str) -> Result<Option<Response>, CacheError>;

    /// Store entries in a bucket, creating it if needed. Either all entries
    /// are written or none are.
    async fn put_all(&self, name: &str, entries: Vec<(String, Response)>) -> Result<(), CacheError>;

    /// Request identities stored in a bucket.
    async fn entry_keys(&self, name: &str) -> Result<Vec<String>, CacheError>;

    async fn put(&self, name: &str, key: String, response: Response) -> Result<(), CacheError> {
        self.put_all(name, vec![(key, response)]).await
    }
}

#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    buckets: RwLock<BTreeMap<String, Bucket>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<(), CacheError> {
        self.buckets
            .write()
            .await
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.buckets.read().await.keys().cloned().collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        Ok(self.buckets.write().await.remove(name).is_some())
    }

    async fn lookup(&self, name: &str, key: &str) -> Result<Option<Response>, CacheError> {
        let buckets = self.buckets.read().await;
        Ok(buckets
            .get(name)
            .and_then(|bucket| bucket.get(key))
            .map(|entry| entry.data.clone()))
    }

    async fn put_all(&self, name: &str, entries: Vec<(String, Response)>) -> Result<(), CacheError> {
        let mut buckets = self.buckets.write().await;
        let bucket = buckets.entry(name.to_string()).or_default();
        for (key, response) in entries {
            bucket.insert(key, CachedData::new(response));
        }
        Ok(())
    }

    async fn entry_keys(&self, name: &str) -> Result<Vec<String>, CacheError> {
        let buckets = self.buckets.read().await;
        Ok(buckets
            .get(name)
            .map(|bucket| bucket.keys().cloned().collect())
            .unwrap_or_default())
    }
}
