//! Tab switching for the trip page.
//!
//! Each tab is a `.tab-btn[data-tab=<name>]` button paired with a
//! `.tab-content#<name>` panel. The selected tab is remembered under the
//! `activeTab` storage key so a reload lands on the same panel.

use miviaje_core::storage::ACTIVE_TAB_KEY;
use miviaje_core::KeyValueStore;
use tracing::{debug, warn};

use crate::dom::{Document, NodeId};

pub const TAB_BUTTON_CLASS: &str = "tab-btn";
pub const TAB_CONTENT_CLASS: &str = "tab-content";
pub const TAB_ATTRIBUTE: &str = "data-tab";
const ACTIVE_CLASS: &str = "active";

fn saved_tab(store: &dyn KeyValueStore) -> Option<String> {
    match store.get(ACTIVE_TAB_KEY) {
        Ok(tab) => tab,
        Err(e) => {
            warn!(error = %e, "Failed to read active tab");
            None
        }
    }
}

/// Activate tab `name`. Returns whether both its button and panel exist.
///
/// Every tab is deactivated first, even when `name` doesn't exist.
pub fn switch_to_tab(doc: &mut Document, store: &dyn KeyValueStore, name: &str) -> bool {
    for node in doc.query_class_all(TAB_BUTTON_CLASS) {
        doc.remove_class(node, ACTIVE_CLASS);
    }
    for node in doc.query_class_all(TAB_CONTENT_CLASS) {
        doc.remove_class(node, ACTIVE_CLASS);
    }

    let button = doc.query_attribute(TAB_ATTRIBUTE, name);
    let content = doc.get_element_by_id(name);
    let (Some(button), Some(content)) = (button, content) else {
        debug!(tab = name, "Tab not found");
        return false;
    };

    doc.add_class(button, ACTIVE_CLASS);
    doc.add_class(content, ACTIVE_CLASS);
    if let Err(e) = store.set(ACTIVE_TAB_KEY, name) {
        warn!(tab = name, error = %e, "Failed to persist active tab");
    }
    true
}

/// Restore the saved tab if its panel exists, else open `default_tab`.
/// Returns the tab that was requested.
pub fn initialize_tabs(doc: &mut Document, store: &dyn KeyValueStore, default_tab: &str) -> String {
    let tab = saved_tab(store)
        .filter(|tab| doc.get_element_by_id(tab).is_some())
        .unwrap_or_else(|| default_tab.to_string());
    switch_to_tab(doc, store, &tab);
    tab
}

/// Handle a click on `node`. Clicks inside a tab button switch to its tab.
pub fn handle_tab_click(doc: &mut Document, store: &dyn KeyValueStore, node: NodeId) -> bool {
    let mut current = Some(node);
    while let Some(n) = current {
        if let Some(element) = doc.get(n) {
            if element.has_class(TAB_BUTTON_CLASS) {
                let Some(tab) = element.attribute(TAB_ATTRIBUTE).map(str::to_string) else {
                    return false;
                };
                return switch_to_tab(doc, store, &tab);
            }
        }
        current = doc.parent(n);
    }
    false
}

/// Name of the active tab, if any.
pub fn active_tab(doc: &Document) -> Option<String> {
    let button = doc.find_first(doc.body(), |e| e.has_class(TAB_BUTTON_CLASS) && e.has_class(ACTIVE_CLASS))?;
    doc.get(button)?.attribute(TAB_ATTRIBUTE).map(str::to_string)
}
