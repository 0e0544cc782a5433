//! Form helpers.

use chrono::NaiveDate;
use tracing::debug;

use crate::dom::{Document, Element, NodeId};

pub const ERROR_CLASS: &str = "error";
pub const ERROR_MESSAGE_CLASS: &str = "error-message";
pub const REQUIRED_MESSAGE: &str = "Este campo es requerido";

fn is_field(element: &Element) -> bool {
    matches!(element.tag.as_str(), "input" | "select" | "textarea")
}

/// Check every required field of `form_id`, marking the empty ones.
///
/// An empty field (after trimming) gets the `error` class and a single
/// `.error-message` next to it; a filled one loses both. A missing form has
/// nothing to fail.
pub fn validate_form(doc: &mut Document, form_id: &str) -> bool {
    let Some(form) = doc.get_element_by_id(form_id) else {
        debug!(form_id, "Form not found, nothing to validate");
        return true;
    };

    let fields = doc.find_all(form, |e| is_field(e) && e.has_attribute("required"));
    let mut is_valid = true;

    for field in fields {
        let Some(parent) = doc.parent(field) else {
            continue;
        };
        let existing = doc.find_first(parent, |e| e.has_class(ERROR_MESSAGE_CLASS));
        let empty = doc.get(field).is_some_and(|e| e.value.trim().is_empty());

        if empty {
            is_valid = false;
            doc.add_class(field, ERROR_CLASS);
            if existing.is_none() {
                doc.insert(
                    parent,
                    Element::new("div")
                        .with_class(ERROR_MESSAGE_CLASS)
                        .with_text(REQUIRED_MESSAGE),
                );
            }
        } else {
            doc.remove_class(field, ERROR_CLASS);
            if let Some(message) = existing {
                doc.remove(message);
            }
        }
    }

    is_valid
}

/// Reset the fields of `form_id` to their default values and drop error markers.
pub fn clear_form(doc: &mut Document, form_id: &str) {
    let Some(form) = doc.get_element_by_id(form_id) else {
        return;
    };

    for node in doc.find_all(form, is_field) {
        if let Some(field) = doc.get_mut(node) {
            field.value = field.attribute("value").unwrap_or_default().to_string();
        }
    }
    for node in doc.find_all(form, |e| e.has_class(ERROR_CLASS)) {
        doc.remove_class(node, ERROR_CLASS);
    }
    for node in doc.find_all(form, |e| e.has_class(ERROR_MESSAGE_CLASS)) {
        doc.remove(node);
    }
}

/// Fill empty date inputs whose id mentions `fecha` with `today`.
pub fn prefill_date_inputs(doc: &mut Document, today: NaiveDate) -> usize {
    let targets: Vec<NodeId> = doc.find_all(doc.body(), |e| {
        e.tag == "input"
            && e.attribute("type") == Some("date")
            && e.value.is_empty()
            && e.id.as_deref().is_some_and(|id| id.contains("fecha"))
    });

    let value = today.format("%Y-%m-%d").to_string();
    for &node in &targets {
        if let Some(input) = doc.get_mut(node) {
            input.value = value.clone();
        }
    }
    targets.len()
}
