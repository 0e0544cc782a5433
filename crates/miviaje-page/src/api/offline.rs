//! Queue of API calls that failed while offline.
//!
//! The queue is a JSON list under the `offlineData` storage key. Updates are
//! read-then-write; two pages sharing the storage can lose each other's
//! appends.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use miviaje_core::storage::{load_json, save_json, OFFLINE_DATA_KEY};
use miviaje_core::{KeyValueStore, StorageError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::transport::{RequestOptions, Transport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub url: String,
    #[serde(default)]
    pub options: RequestOptions,
    pub timestamp: DateTime<Utc>,
}

impl PendingAction {
    pub fn new(url: &str, options: RequestOptions, timestamp: DateTime<Utc>) -> Self {
        Self {
            url: url.to_string(),
            options,
            timestamp,
        }
    }
}

/// Result of replaying the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplaySummary {
    pub sent: usize,
    pub remaining: usize,
}

#[derive(Clone)]
pub struct OfflineQueue {
    store: Arc<dyn KeyValueStore>,
}

impl OfflineQueue {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Pending actions, oldest first. `None` when nothing was ever queued.
    pub fn load(&self) -> Result<Option<Vec<PendingAction>>, StorageError> {
        load_json(self.store.as_ref(), OFFLINE_DATA_KEY)
    }

    pub fn push(&self, action: PendingAction) -> Result<usize, StorageError> {
        let mut actions = self.load()?.unwrap_or_default();
        actions.push(action);
        save_json(self.store.as_ref(), OFFLINE_DATA_KEY, &actions)?;
        Ok(actions.len())
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(OFFLINE_DATA_KEY)
    }

    /// Send queued actions in order, stopping at the first failure.
    ///
    /// The failed action and everything after it stay queued.
    pub async fn replay(&self, transport: &dyn Transport) -> Result<ReplaySummary, StorageError> {
        let Some(actions) = self.load()? else {
            return Ok(ReplaySummary::default());
        };

        let mut sent = 0;
        for action in &actions {
            match transport.send(&action.url, &action.options).await {
                Ok(response) if response.ok() => {
                    debug!(url = %action.url, "Replayed offline action");
                    sent += 1;
                }
                Ok(response) => {
                    warn!(url = %action.url, status = response.status, "Offline action rejected");
                    break;
                }
                Err(e) => {
                    warn!(url = %action.url, error = %e, "Offline action still failing");
                    break;
                }
            }
        }

        let remaining = &actions[sent..];
        if remaining.is_empty() {
            self.clear()?;
        } else {
            save_json(self.store.as_ref(), OFFLINE_DATA_KEY, remaining)?;
        }
        info!(sent, remaining = remaining.len(), "Offline queue replayed");
        Ok(ReplaySummary {
            sent,
            remaining: remaining.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use miviaje_core::{Method, MemoryStore};

    use super::*;
    use crate::api::transport::tests::ScriptedTransport;

    fn action(url: &str) -> PendingAction {
        PendingAction::new(
            url,
            RequestOptions {
                method: Method::Post,
                ..Default::default()
            },
            Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap(),
        )
    }

    fn queue() -> (OfflineQueue, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (OfflineQueue::new(store.clone()), store)
    }

    #[test]
    fn test_push_appends_in_order() {
        let (queue, store) = queue();
        assert_eq!(queue.load().unwrap(), None);

        assert_eq!(queue.push(action("/api/gastos")).unwrap(), 1);
        assert_eq!(queue.push(action("/api/viajes")).unwrap(), 2);

        let urls: Vec<String> = queue.load().unwrap().unwrap().into_iter().map(|a| a.url).collect();
        assert_eq!(urls, vec!["/api/gastos", "/api/viajes"]);

        let raw = store.get("offlineData").unwrap().unwrap();
        assert!(raw.contains(r#""timestamp":"2024-03-15T10:30:00Z""#));
    }

    #[test]
    fn test_clear_removes_key() {
        let (queue, store) = queue();
        queue.push(action("/api/gastos")).unwrap();
        queue.clear().unwrap();
        assert_eq!(store.get("offlineData").unwrap(), None);
    }

    #[tokio::test]
    async fn test_replay_keeps_unsent_tail() {
        let (queue, _) = queue();
        for url in ["/a", "/b", "/c"] {
            queue.push(action(url)).unwrap();
        }
        let transport = ScriptedTransport::default();
        transport.respond("/a", 200, "{}");
        transport.fail("/b");
        transport.respond("/c", 200, "{}");

        let summary = queue.replay(&transport).await.unwrap();
        assert_eq!(summary, ReplaySummary { sent: 1, remaining: 2 });

        let urls: Vec<String> = queue.load().unwrap().unwrap().into_iter().map(|a| a.url).collect();
        assert_eq!(urls, vec!["/b", "/c"]);
        assert_eq!(transport.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_replay_all_sent_clears_queue() {
        let (queue, store) = queue();
        queue.push(action("/a")).unwrap();
        let transport = ScriptedTransport::default();
        transport.respond("/a", 201, "{}");

        let summary = queue.replay(&transport).await.unwrap();
        assert_eq!(summary, ReplaySummary { sent: 1, remaining: 0 });
        assert_eq!(store.get("offlineData").unwrap(), None);
    }
}
