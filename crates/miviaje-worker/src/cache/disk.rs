use std::path::{Path, PathBuf};

use async_trait::async_trait;
use miviaje_core::Response;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::storage::{Bucket, CacheStorage, CachedData};
use crate::error::CacheError;

/// On-disk layout of one bucket.
#[derive(Debug, Default, Serialize, Deserialize)]
struct BucketFile {
    name: String,
    entries: Bucket,
}

/// Cache storage keeping each bucket in its own JSON file.
pub struct DiskCacheStorage {
    cache_dir: PathBuf,
    // Serializes read-modify-write cycles on bucket files
    lock: Mutex<()>,
}

impl DiskCacheStorage {
    pub fn new(cache_dir: PathBuf) -> Result<Self, CacheError> {
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            cache_dir,
            lock: Mutex::new(()),
        })
    }

    /// Bucket names are hex-encoded so every name maps to its own file.
    fn bucket_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", hex::encode(name.as_bytes())))
    }

    /// Load the bucket called `name`. A file holding another name is ignored.
    fn load_bucket(&self, name: &str) -> Result<Option<BucketFile>, CacheError> {
        match Self::load(&self.bucket_path(name))? {
            Some(bucket) if bucket.name == name => Ok(Some(bucket)),
            Some(bucket) => {
                warn!(cache = name, stored = %bucket.name, "Bucket file holds another cache, ignoring");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn load(path: &Path) -> Result<Option<BucketFile>, CacheError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(path: &Path, bucket: &BucketFile) -> Result<(), CacheError> {
        let contents = serde_json::to_string(bucket)?;
        // Write-then-rename so a crash never leaves a half-written bucket
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[async_trait]
impl CacheStorage for DiskCacheStorage {
    async fn open(&self, name: &str) -> Result<(), CacheError> {
        let _guard = self.lock.lock().await;
        if self.load_bucket(name)?.is_none() {
            debug!(cache = name, "Creating cache bucket");
            Self::save(
                &self.bucket_path(name),
                &BucketFile {
                    name: name.to_string(),
                    entries: Bucket::new(),
                },
            )?;
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        let _guard = self.lock.lock().await;
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(bucket) = Self::load(&path)? {
                if path == self.bucket_path(&bucket.name) {
                    names.push(bucket.name);
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        let _guard = self.lock.lock().await;
        if self.load_bucket(name)?.is_some() {
            std::fs::remove_file(self.bucket_path(name))?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn lookup(&self, name: &str, key: &str) -> Result<Option<Response>, CacheError> {
        let _guard = self.lock.lock().await;
        let bucket = self.load_bucket(name)?;
        Ok(bucket.and_then(|mut b| b.entries.remove(key)).map(|entry| entry.data))
    }

    async fn put_all(&self, name: &str, entries: Vec<(String, Response)>) -> Result<(), CacheError> {
        let _guard = self.lock.lock().await;
        let mut bucket = self.load_bucket(name)?.unwrap_or_else(|| BucketFile {
            name: name.to_string(),
            entries: Bucket::new(),
        });
        for (key, response) in entries {
            bucket.entries.insert(key, CachedData::new(response));
        }
        Self::save(&self.bucket_path(name), &bucket)
    }

    async fn entry_keys(&self, name: &str) -> Result<Vec<String>, CacheError> {
        let _guard = self.lock.lock().await;
        Ok(self
            .load_bucket(name)?
            .map(|b| b.entries.into_keys().collect())
            .unwrap_or_default())
    }
}
