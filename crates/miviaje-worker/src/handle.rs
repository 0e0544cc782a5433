//! Running a service worker in its own execution context.
//!
//! The worker lives in a dedicated tokio task and is reachable only through
//! a `WorkerHandle`. Lifecycle events are processed in order, so activation
//! never starts before install has finished. Fetch events are answered
//! concurrently once the worker is active.

use miviaje_core::Request;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::cache::FetchOutcome;
use crate::error::WorkerError;
use crate::lifecycle::{ServiceWorker, WorkerState};
use crate::push::{ClickOutcome, Notification};
use crate::sync::SyncOutcome;

/// Buffer size for the worker's event channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

type Reply<T> = oneshot::Sender<Result<T, WorkerError>>;

/// Events the platform dispatches to the worker.
pub enum WorkerEvent {
    Install(Reply<usize>),
    Activate(Reply<Vec<String>>),
    Fetch(Request, Reply<FetchOutcome>),
    Sync(String, Reply<SyncOutcome>),
    Push(Option<String>, Reply<Notification>),
    NotificationClick(Option<String>, Reply<ClickOutcome>),
    State(oneshot::Sender<WorkerState>),
}

/// Send a reply, logging if the caller went away
fn reply<T>(tx: Reply<T>, result: Result<T, WorkerError>) {
    if tx.send(result).is_err() {
        debug!("Worker reply dropped - caller no longer waiting");
    }
}

/// Spawn `worker` as a task. The task ends when every handle is dropped.
pub fn spawn_worker(mut worker: ServiceWorker) -> (WorkerHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<WorkerEvent>(CHANNEL_BUFFER_SIZE);

    let task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                WorkerEvent::Install(tx) => reply(tx, worker.install().await),
                WorkerEvent::Activate(tx) => reply(tx, worker.activate().await),
                WorkerEvent::Fetch(request, tx) => {
                    if worker.state().can_intercept_fetch() {
                        let cache = worker.cache().clone();
                        tokio::spawn(async move {
                            let result = cache.handle_fetch(&request).await.map_err(WorkerError::from);
                            reply(tx, result);
                        });
                    } else {
                        reply(tx, worker.fetch(&request).await);
                    }
                }
                WorkerEvent::Sync(tag, tx) => reply(tx, Ok(worker.sync(&tag).await)),
                WorkerEvent::Push(payload, tx) => reply(tx, worker.push(payload.as_deref()).await),
                WorkerEvent::NotificationClick(action, tx) => {
                    reply(tx, worker.notification_click(action.as_deref()).await)
                }
                WorkerEvent::State(tx) => {
                    if tx.send(worker.state()).is_err() {
                        debug!("State reply dropped");
                    }
                }
            }
        }
        debug!("Worker event channel closed, stopping");
    });

    (WorkerHandle { tx }, task)
}

/// Cloneable handle for dispatching events to a running worker.
#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<WorkerEvent>,
}

impl WorkerHandle {
    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> WorkerEvent) -> Result<T, WorkerError> {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(make(tx)).await.is_err() {
            error!("Failed to dispatch worker event - worker stopped");
            return Err(WorkerError::Terminated);
        }
        rx.await.map_err(|_| WorkerError::Terminated)?
    }

    pub async fn install(&self) -> Result<usize, WorkerError> {
        self.request(WorkerEvent::Install).await
    }

    pub async fn activate(&self) -> Result<Vec<String>, WorkerError> {
        self.request(WorkerEvent::Activate).await
    }

    pub async fn fetch(&self, request: Request) -> Result<FetchOutcome, WorkerError> {
        self.request(|tx| WorkerEvent::Fetch(request, tx)).await
    }

    pub async fn sync(&self, tag: impl Into<String>) -> Result<SyncOutcome, WorkerError> {
        let tag = tag.into();
        self.request(|tx| WorkerEvent::Sync(tag, tx)).await
    }

    pub async fn push(&self, payload: Option<String>) -> Result<Notification, WorkerError> {
        self.request(|tx| WorkerEvent::Push(payload, tx)).await
    }

    pub async fn notification_click(&self, action: Option<String>) -> Result<ClickOutcome, WorkerError> {
        self.request(|tx| WorkerEvent::NotificationClick(action, tx)).await
    }

    pub async fn state(&self) -> Result<WorkerState, WorkerError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(WorkerEvent::State(tx))
            .await
            .map_err(|_| WorkerError::Terminated)?;
        rx.await.map_err(|_| WorkerError::Terminated)
    }
}
