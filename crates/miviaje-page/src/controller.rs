//! Page controller: wires the page to the platform's PWA events.
//!
//! On `init` the controller registers the service worker script and shows
//! the offline banner when the device starts offline. Everything else is
//! driven by `PageEvent`s dispatched through `handle_event`.

use std::sync::Arc;

use chrono::Utc;
use miviaje_core::{Config, KeyValueStore, ReplayPolicy};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, OfflineQueue, ReplaySummary, Transport};
use crate::dom::{Element, NodeId, SharedDocument};
use crate::platform::{InstallPrompt, Platform, UserChoice};
use crate::ui::{handle_tab_click, initialize_tabs, prefill_date_inputs};

pub const INSTALL_BUTTON_CLASS: &str = "install-btn";
pub const HEADER_ACTIONS_CLASS: &str = "header-actions";
pub const OFFLINE_MESSAGE_CLASS: &str = "offline-message";
pub const OFFLINE_MESSAGE: &str = "Modo offline - Los cambios se sincronizarán cuando tengas conexión";
const TABS_CLASS: &str = "tabs";
const SHOW_CLASS: &str = "show";

/// Events the platform delivers to the page.
pub enum PageEvent {
    /// The document finished parsing
    DomContentLoaded,
    /// `beforeinstallprompt`, default already suppressed
    BeforeInstallPrompt(Arc<dyn InstallPrompt>),
    AppInstalled,
    Online,
    Offline,
    /// Click on an element
    Click(NodeId),
}

/// What the reconnect sync did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncReport {
    /// Nothing was queued
    Empty,
    /// Queued actions were logged and dropped
    Cleared(usize),
    Replayed(ReplaySummary),
}

pub struct PageController {
    config: Config,
    document: SharedDocument,
    platform: Arc<dyn Platform>,
    store: Arc<dyn KeyValueStore>,
    api: ApiClient,
    deferred_prompt: Option<Arc<dyn InstallPrompt>>,
}

impl PageController {
    pub fn new(
        config: Config,
        document: SharedDocument,
        platform: Arc<dyn Platform>,
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let api = ApiClient::new(
            transport,
            platform.clone(),
            OfflineQueue::new(store.clone()),
            document.clone(),
        );
        Self {
            config,
            document,
            platform,
            store,
            api,
            deferred_prompt: None,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    pub fn has_deferred_prompt(&self) -> bool {
        self.deferred_prompt.is_some()
    }

    pub async fn init(&mut self) {
        self.setup_service_worker().await;
        if !self.platform.is_online() {
            self.show_offline_message();
        }
    }

    /// Register the worker script. Failures are logged and never block the page.
    async fn setup_service_worker(&self) {
        if !self.platform.supports_service_worker() {
            debug!("Service workers not supported, skipping registration");
            return;
        }
        let script = self.config.service_worker_url.as_str();
        match self.platform.register_service_worker(script).await {
            Ok(scope) => info!(script, scope = %scope, "Service worker registered"),
            Err(e) => warn!(script, error = %e, "Service worker registration failed"),
        }
    }

    pub async fn handle_event(&mut self, event: PageEvent) {
        match event {
            PageEvent::DomContentLoaded => self.on_dom_content_loaded(),
            PageEvent::BeforeInstallPrompt(prompt) => {
                self.deferred_prompt = Some(prompt);
                self.show_install_button();
            }
            PageEvent::AppInstalled => {
                info!("App installed");
                self.hide_install_button();
            }
            PageEvent::Online => {
                self.hide_offline_message();
                self.sync_offline_data().await;
            }
            PageEvent::Offline => self.show_offline_message(),
            PageEvent::Click(node) => self.on_click(node).await,
        }
    }

    fn on_dom_content_loaded(&self) {
        let store = self.store.as_ref();
        let default_tab = self.config.default_tab.as_str();
        self.document.with(|doc| {
            if doc.query_class(TABS_CLASS).is_some() {
                initialize_tabs(doc, store, default_tab);
            }
            prefill_date_inputs(doc, Utc::now().date_naive());
        });
    }

    async fn on_click(&mut self, node: NodeId) {
        let on_install_button = self.document.with(|doc| {
            let mut current = Some(node);
            while let Some(n) = current {
                if doc.has_class(n, INSTALL_BUTTON_CLASS) {
                    return true;
                }
                current = doc.parent(n);
            }
            false
        });
        if on_install_button {
            self.install_app().await;
            return;
        }

        let store = self.store.as_ref();
        self.document.with(|doc| handle_tab_click(doc, store, node));
    }

    fn show_install_button(&self) {
        self.document.with(|doc| {
            if doc.query_class(INSTALL_BUTTON_CLASS).is_some() {
                return;
            }
            let Some(header) = doc.query_class(HEADER_ACTIONS_CLASS) else {
                debug!("No header actions, install button not shown");
                return;
            };
            let button = doc.insert(
                header,
                Element::new("button")
                    .with_class(INSTALL_BUTTON_CLASS)
                    .with_text("Instalar App"),
            );
            doc.insert(
                button,
                Element::new("span").with_class("material-icons").with_text("get_app"),
            );
        });
    }

    fn hide_install_button(&self) {
        self.document.with(|doc| {
            if let Some(button) = doc.query_class(INSTALL_BUTTON_CLASS) {
                doc.remove(button);
            }
        });
    }

    /// Replay the deferred install prompt. The prompt is single-use.
    pub async fn install_app(&mut self) -> Option<UserChoice> {
        let prompt = self.deferred_prompt.take()?;
        let choice = match prompt.prompt().await {
            Ok(UserChoice::Accepted) => {
                info!("User accepted the install prompt");
                Some(UserChoice::Accepted)
            }
            Ok(UserChoice::Dismissed) => {
                info!("User dismissed the install prompt");
                Some(UserChoice::Dismissed)
            }
            Err(e) => {
                warn!(error = %e, "Install prompt failed");
                None
            }
        };
        self.hide_install_button();
        choice
    }

    fn show_offline_message(&self) {
        self.document.with(|doc| {
            let banner = match doc.query_class(OFFLINE_MESSAGE_CLASS) {
                Some(banner) => banner,
                None => {
                    let body = doc.body();
                    let banner = doc.insert(
                        body,
                        Element::new("div")
                            .with_class(OFFLINE_MESSAGE_CLASS)
                            .with_text(OFFLINE_MESSAGE),
                    );
                    doc.insert(
                        banner,
                        Element::new("span").with_class("material-icons").with_text("wifi_off"),
                    );
                    banner
                }
            };
            doc.add_class(banner, SHOW_CLASS);
        });
    }

    fn hide_offline_message(&self) {
        self.document.with(|doc| {
            if let Some(banner) = doc.query_class(OFFLINE_MESSAGE_CLASS) {
                doc.remove_class(banner, SHOW_CLASS);
            }
        });
    }

    /// Handle queued offline actions after reconnecting.
    pub async fn sync_offline_data(&self) -> SyncReport {
        let queue = self.api.queue();
        match self.config.replay_policy {
            ReplayPolicy::LogAndClear => {
                let actions = match queue.load() {
                    Ok(Some(actions)) => actions,
                    Ok(None) => return SyncReport::Empty,
                    Err(e) => {
                        warn!(error = %e, "Unreadable offline queue left in place");
                        return SyncReport::Empty;
                    }
                };
                info!(count = actions.len(), actions = ?actions, "Syncing offline data");
                if let Err(e) = queue.clear() {
                    warn!(error = %e, "Failed to clear offline queue");
                }
                SyncReport::Cleared(actions.len())
            }
            ReplayPolicy::Replay => match queue.replay(self.api.transport()).await {
                Ok(summary) if summary.sent == 0 && summary.remaining == 0 => SyncReport::Empty,
                Ok(summary) => SyncReport::Replayed(summary),
                Err(e) => {
                    warn!(error = %e, "Offline replay failed");
                    SyncReport::Empty
                }
            },
        }
    }
}
