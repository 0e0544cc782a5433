//! Service worker lifecycle.
//!
//! A worker moves `Parsed -> Installing -> Installed -> Activating ->
//! Activated`. A failed install makes it `Redundant`. Fetch interception only
//! applies once activated; before that the page isn't controlled and
//! requests go straight to the network.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use miviaje_core::{Network, Request};
use tracing::{info, warn};

use crate::cache::{CacheManager, FetchOutcome, ResponseSource};
use crate::error::WorkerError;
use crate::push::{build_notification, click_outcome, ClickOutcome, Notification, NotificationHost};
use crate::sync::{handle_sync, SyncOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl WorkerState {
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Activated)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        write!(f, "{}", name)
    }
}

pub struct ServiceWorker {
    state: WorkerState,
    cache: CacheManager,
    network: Arc<dyn Network>,
    host: Arc<dyn NotificationHost>,
}

impl ServiceWorker {
    pub fn new(cache: CacheManager, network: Arc<dyn Network>, host: Arc<dyn NotificationHost>) -> Self {
        Self {
            state: WorkerState::Parsed,
            cache,
            network,
            host,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    fn expect_state(&self, expected: WorkerState) -> Result<(), WorkerError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(WorkerError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    /// Run the install step. A precache failure makes the worker redundant.
    pub async fn install(&mut self) -> Result<usize, WorkerError> {
        self.expect_state(WorkerState::Parsed)?;
        self.state = WorkerState::Installing;

        match self.cache.install().await {
            Ok(count) => {
                self.state = WorkerState::Installed;
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "Install failed, worker is redundant");
                self.state = WorkerState::Redundant;
                Err(e.into())
            }
        }
    }

    /// Run the activate step, evicting stale cache generations.
    /// A failed eviction leaves the worker installed so activation can be retried.
    pub async fn activate(&mut self) -> Result<Vec<String>, WorkerError> {
        self.expect_state(WorkerState::Installed)?;
        self.state = WorkerState::Activating;

        match self.cache.activate().await {
            Ok(evicted) => {
                self.state = WorkerState::Activated;
                info!(cache = %self.cache.cache_name(), evicted = evicted.len(), "Worker activated");
                Ok(evicted)
            }
            Err(e) => {
                warn!(error = %e, "Activation failed, worker stays installed");
                self.state = WorkerState::Installed;
                Err(e.into())
            }
        }
    }

    /// Intercept a fetch, or pass it through when the worker isn't active yet.
    pub async fn fetch(&self, request: &Request) -> Result<FetchOutcome, WorkerError> {
        if self.state.can_intercept_fetch() {
            return Ok(self.cache.handle_fetch(request).await?);
        }
        let response = self.network.fetch(request).await?;
        Ok(FetchOutcome {
            response,
            source: ResponseSource::Network,
        })
    }

    pub async fn sync(&self, tag: &str) -> SyncOutcome {
        handle_sync(tag).await
    }

    pub async fn push(&self, payload: Option<&str>) -> Result<Notification, WorkerError> {
        let notification = build_notification(payload, Utc::now());
        self.host.show_notification(&notification).await?;
        Ok(notification)
    }

    pub async fn notification_click(&self, action: Option<&str>) -> Result<ClickOutcome, WorkerError> {
        let outcome = click_outcome(action);
        if let ClickOutcome::OpenApp(ref url) = outcome {
            self.host.open_window(url).await?;
        }
        Ok(outcome)
    }
}
