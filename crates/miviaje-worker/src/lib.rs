//! The Mi Viaje service worker.
//!
//! Runs in its own execution context and owns a single versioned cache
//! bucket. This crate provides:
//!
//! - `cache`: Cache storage backends and the cache-first `CacheManager`
//! - `lifecycle`: The `ServiceWorker` state machine (install, activate, fetch)
//! - `sync`: Background sync hook
//! - `push`: Push notification and notification-click handling
//! - `handle`: Running a worker as a tokio task driven by `WorkerEvent`s
//!
//! The page never calls into this crate directly; it only registers the
//! worker script with its platform.

pub mod cache;
pub mod error;
pub mod handle;
pub mod lifecycle;
pub mod push;
pub mod sync;

pub use cache::{CacheManager, CacheStorage, DiskCacheStorage, FetchOutcome, MemoryCacheStorage, ResponseSource, WorkerConfig};
pub use error::{CacheError, WorkerError};
pub use handle::{spawn_worker, WorkerEvent, WorkerHandle};
pub use lifecycle::{ServiceWorker, WorkerState};
pub use push::{ClickOutcome, Notification, NotificationHost};
pub use sync::SyncOutcome;
