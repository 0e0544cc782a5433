//! Push notifications.
//!
//! Building the notification and deciding what a click does are pure
//! functions; the `NotificationHost` carries the result out on the platform.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const NOTIFICATION_TITLE: &str = "Mi Viaje";
pub const DEFAULT_NOTIFICATION_BODY: &str = "Nueva notificación de Mi Viaje";

/// Action that opens the app
pub const VIEW_ACTION: &str = "explore";
/// Action that only dismisses the notification
pub const DISMISS_ACTION: &str = "close";

/// URL opened by the view action
const APP_ROOT_URL: &str = "/";

const ICON: &str = "/static/icons/icon-192x192.png";
const BADGE: &str = "/static/icons/icon-72x72.png";
const VIBRATE_PATTERN: [u32; 3] = [100, 50, 100];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationData {
    pub date_of_arrival: DateTime<Utc>,
    pub primary_key: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

/// What a notification click resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Notification closed and the app opened (or focused) at this URL
    OpenApp(String),
    /// Notification closed, nothing else
    Dismissed,
}

/// Platform services the worker needs for notifications.
#[async_trait]
pub trait NotificationHost: Send + Sync {
    async fn show_notification(&self, notification: &Notification) -> anyhow::Result<()>;

    /// Open a window at `url`, or focus one already showing it.
    async fn open_window(&self, url: &str) -> anyhow::Result<()>;
}

/// Build the notification for a push payload. Blank payloads use the default body.
pub fn build_notification(payload: Option<&str>, now: DateTime<Utc>) -> Notification {
    let body = payload
        .filter(|text| !text.is_empty())
        .unwrap_or(DEFAULT_NOTIFICATION_BODY);

    Notification {
        title: NOTIFICATION_TITLE.to_string(),
        body: body.to_string(),
        icon: ICON.to_string(),
        badge: BADGE.to_string(),
        vibrate: VIBRATE_PATTERN.to_vec(),
        data: NotificationData {
            date_of_arrival: now,
            primary_key: 1,
        },
        actions: vec![
            NotificationAction {
                action: VIEW_ACTION.to_string(),
                title: "Ver detalles".to_string(),
                icon: ICON.to_string(),
            },
            NotificationAction {
                action: DISMISS_ACTION.to_string(),
                title: "Cerrar".to_string(),
                icon: ICON.to_string(),
            },
        ],
    }
}

pub fn click_outcome(action: Option<&str>) -> ClickOutcome {
    match action {
        Some(VIEW_ACTION) => ClickOutcome::OpenApp(APP_ROOT_URL.to_string()),
        _ => ClickOutcome::Dismissed,
    }
}
