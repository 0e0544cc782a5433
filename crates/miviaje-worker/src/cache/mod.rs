//! Versioned asset cache for offline access.
//!
//! The worker owns one bucket named by the current version tag. Buckets map
//! a request identity (method + URL) to a stored response snapshot. Entries
//! never expire: a stale asset is only replaced by bumping the version tag,
//! which makes activation evict the old bucket.
//!
//! Storage backends:
//! - `MemoryCacheStorage`: process-local, used in tests
//! - `DiskCacheStorage`: one JSON file per bucket under the cache directory

pub mod disk;
pub mod manager;
pub mod storage;

pub use disk::DiskCacheStorage;
pub use manager::{CacheManager, FetchOutcome, ResponseSource, WorkerConfig};
pub use storage::{Bucket, CacheStorage, CachedData, MemoryCacheStorage};
