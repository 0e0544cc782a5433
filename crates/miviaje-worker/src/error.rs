use miviaje_core::FetchError;
use thiserror::Error;

use crate::lifecycle::WorkerState;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to precache {url}: {source}")]
    Precache {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("Invalid precache URL: {0}")]
    InvalidUrl(String),

    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt cache bucket: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker is {actual}, expected {expected}")]
    InvalidState {
        expected: WorkerState,
        actual: WorkerState,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Notification host error: {0}")]
    Host(#[from] anyhow::Error),

    #[error("Worker task has stopped")]
    Terminated,
}
