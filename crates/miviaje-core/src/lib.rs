//! Shared building blocks for the Mi Viaje PWA shell.
//!
//! Both execution contexts (the page and the service worker) depend on this
//! crate, but never on each other:
//!
//! - `config`: Application configuration with JSON persistence
//! - `http`: Request/response model and the `Network` seam (reqwest-backed)
//! - `storage`: Local key-value storage (`KeyValueStore`) and its backends
//! - `utils`: Date, currency and device formatting helpers

pub mod config;
pub mod http;
pub mod storage;
pub mod utils;

pub use config::{Config, ReplayPolicy};
pub use http::{FetchError, HttpNetwork, Method, Network, Request, RequestMode, Response, ResponseType};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
