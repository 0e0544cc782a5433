use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use super::error::ApiError;
use super::offline::{OfflineQueue, PendingAction};
use super::transport::{RequestOptions, Transport};
use crate::dom::SharedDocument;
use crate::platform::Platform;
use crate::ui::{show_toast, ToastKind};

pub const OFFLINE_SAVED_MESSAGE: &str = "Guardado offline. Se sincronizará cuando tengas conexión.";
pub const CONNECTION_ERROR_MESSAGE: &str = "Error de conexión. Por favor intenta de nuevo.";

/// Wrapper for the app's same-origin API calls.
///
/// A failed call is reported to the user: queued for later when the device
/// is offline, or shown as a connection error otherwise. The error is always
/// returned so callers can react too.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    platform: Arc<dyn Platform>,
    queue: OfflineQueue,
    document: SharedDocument,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        platform: Arc<dyn Platform>,
        queue: OfflineQueue,
        document: SharedDocument,
    ) -> Self {
        Self {
            transport,
            platform,
            queue,
            document,
        }
    }

    pub fn queue(&self) -> &OfflineQueue {
        &self.queue
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    async fn request<T: DeserializeOwned>(&self, url: &str, options: &RequestOptions) -> Result<T, ApiError> {
        debug!(method = options.method.as_str(), url, "API call");
        let response = self.transport.send(url, options).await?;
        if !response.ok() {
            return Err(ApiError::http(response.status, &response.text()));
        }
        response
            .json()
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// Perform an API call and decode its JSON body.
    pub async fn handle_api_call<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        match self.request(url, &options).await {
            Ok(value) => Ok(value),
            Err(e) => {
                error!(url, error = %e, "API call failed");
                self.report_failure(url, options);
                Err(e)
            }
        }
    }

    fn report_failure(&self, url: &str, options: RequestOptions) {
        if self.platform.is_online() {
            show_toast(&self.document, CONNECTION_ERROR_MESSAGE, ToastKind::Error);
            return;
        }

        match self.queue.push(PendingAction::new(url, options, Utc::now())) {
            Ok(pending) => {
                info!(url, pending, "Saved API call for later sync");
                show_toast(&self.document, OFFLINE_SAVED_MESSAGE, ToastKind::Info);
            }
            Err(e) => {
                warn!(url, error = %e, "Failed to queue offline action");
                show_toast(&self.document, CONNECTION_ERROR_MESSAGE, ToastKind::Error);
            }
        }
    }
}
