use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::dom::{Document, Element, SharedDocument};

const LOADING_ID: &str = "loading";
const HIDDEN_CLASS: &str = "hidden";

pub const TOAST_CLASS: &str = "toast";
const SHOW_CLASS: &str = "show";

/// Delay before a new toast slides in
pub const TOAST_SHOW_DELAY: Duration = Duration::from_millis(100);
/// Time from creation until the toast starts hiding
pub const TOAST_HIDE_AFTER: Duration = Duration::from_millis(3000);
/// Hide transition before the element is removed
pub const TOAST_FADE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastKind::Info => "info",
            ToastKind::Success => "success",
            ToastKind::Warning => "warning",
            ToastKind::Error => "error",
        }
    }
}

pub fn show_loading(doc: &mut Document) {
    if let Some(loading) = doc.get_element_by_id(LOADING_ID) {
        doc.remove_class(loading, HIDDEN_CLASS);
    }
}

pub fn hide_loading(doc: &mut Document) {
    if let Some(loading) = doc.get_element_by_id(LOADING_ID) {
        doc.add_class(loading, HIDDEN_CLASS);
    }
}

/// Replace any current toast with a new one and schedule its lifecycle.
///
/// The returned handle completes once the toast has been removed. Dropping it
/// doesn't cancel the timers.
pub fn show_toast(document: &SharedDocument, message: &str, kind: ToastKind) -> JoinHandle<()> {
    let toast = document.with(|doc| {
        if let Some(existing) = doc.query_class(TOAST_CLASS) {
            doc.remove(existing);
        }
        let body = doc.body();
        doc.insert(
            body,
            Element::new("div")
                .with_class(TOAST_CLASS)
                .with_class(kind.as_str())
                .with_text(message),
        )
    });

    let document = document.clone();
    tokio::spawn(async move {
        sleep(TOAST_SHOW_DELAY).await;
        document.with(|doc| doc.add_class(toast, SHOW_CLASS));

        sleep(TOAST_HIDE_AFTER - TOAST_SHOW_DELAY).await;
        document.with(|doc| doc.remove_class(toast, SHOW_CLASS));

        sleep(TOAST_FADE).await;
        document.with(|doc| doc.remove(toast));
    })
}
