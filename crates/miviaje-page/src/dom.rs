//! Minimal document model for the page context.
//!
//! Elements live in an arena and are addressed by `NodeId`. The tree is
//! rooted at `body`; an element that isn't reachable from it is invisible
//! to every query. Removing an element releases it and its descendants:
//! their slots are reused by later elements, and the old ids go stale, so
//! any operation through them is a no-op.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Handle to an element. Carries the slot generation so a stale handle
/// never reaches an element created later in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub text: String,
    /// Current value of form fields
    pub value: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
        self
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// `className` as the platform renders it
    pub fn class_name(&self) -> String {
        self.classes.join(" ")
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    element: Option<Element>,
}

#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                element: Some(Element::new("body")),
            }],
            free: Vec::new(),
        }
    }

    pub fn body(&self) -> NodeId {
        NodeId {
            index: 0,
            generation: 0,
        }
    }

    /// Add a detached element to the arena, reusing a released slot if any.
    pub fn create_element(&mut self, element: Element) -> NodeId {
        let mut element = element;
        element.children.clear();
        element.parent = None;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.element = Some(element);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            element: Some(element),
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Create `element` and append it to `parent` in one step.
    pub fn insert(&mut self, parent: NodeId, element: Element) -> NodeId {
        let node = self.create_element(element);
        self.append_child(parent, node);
        node
    }

    /// Append `child` to `parent`, moving it if it's already attached elsewhere.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.get(parent).is_none() || self.get(child).is_none() || self.is_ancestor(child, parent) {
            return;
        }
        self.detach(child);
        if let Some(element) = self.get_mut(child) {
            element.parent = Some(parent);
        }
        if let Some(element) = self.get_mut(parent) {
            element.children.push(child);
        }
    }

    /// Remove `node` and release it with its descendants. Stale ids are ignored.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.body() || self.get(node).is_none() {
            return;
        }
        self.detach(node);
        self.release(node);
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        if let Some(element) = self.get_mut(parent) {
            element.children.retain(|&c| c != node);
        }
        if let Some(element) = self.get_mut(node) {
            element.parent = None;
        }
    }

    /// Free `node` and its subtree. The caller has already detached it.
    fn release(&mut self, node: NodeId) {
        let mut released = self.descendants(node);
        released.push(node);
        for id in released {
            let slot = &mut self.slots[id.index];
            slot.element = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
        }
    }

    /// Remove and release every child of `node`.
    pub fn clear_children(&mut self, node: NodeId) {
        let Some(element) = self.get_mut(node) else {
            return;
        };
        let children = std::mem::take(&mut element.children);
        for child in children {
            self.release(child);
        }
    }

    pub fn get(&self, node: NodeId) -> Option<&Element> {
        self.slots
            .get(node.index)
            .filter(|slot| slot.generation == node.generation)
            .and_then(|slot| slot.element.as_ref())
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        self.slots
            .get_mut(node.index)
            .filter(|slot| slot.generation == node.generation)
            .and_then(|slot| slot.element.as_mut())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|e| e.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.get(node).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    /// Whether `ancestor` is `node` or one of its parents.
    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Whether `node` is reachable from `body`.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.get(node).is_some() && self.is_ancestor(self.body(), node)
    }

    /// Descendants of `root` in document order, excluding `root` itself.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Connected descendants of `root` matching `pred`.
    pub fn find_all(&self, root: NodeId, pred: impl Fn(&Element) -> bool) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&n| self.get(n).is_some_and(&pred))
            .collect()
    }

    pub fn find_first(&self, root: NodeId, pred: impl Fn(&Element) -> bool) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|&n| self.get(n).is_some_and(&pred))
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_first(self.body(), |e| e.id.as_deref() == Some(id))
    }

    /// First element carrying `class`, like `querySelector('.class')`.
    pub fn query_class(&self, class: &str) -> Option<NodeId> {
        self.find_first(self.body(), |e| e.has_class(class))
    }

    pub fn query_class_all(&self, class: &str) -> Vec<NodeId> {
        self.find_all(self.body(), |e| e.has_class(class))
    }

    /// First element whose attribute `name` equals `value`.
    pub fn query_attribute(&self, name: &str, value: &str) -> Option<NodeId> {
        self.find_first(self.body(), |e| e.attribute(name) == Some(value))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.get_mut(node) {
            if !element.has_class(class) {
                element.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.get_mut(node) {
            element.classes.retain(|c| c != class);
        }
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.get(node).is_some_and(|e| e.has_class(class))
    }
}

/// Document shared between the controller and its timers.
#[derive(Debug, Clone, Default)]
pub struct SharedDocument(Arc<Mutex<Document>>);

impl SharedDocument {
    pub fn new(document: Document) -> Self {
        Self(Arc::new(Mutex::new(document)))
    }

    /// Run `f` with the document locked. Never hold the lock across an await.
    pub fn with<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        let mut document = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queries_follow_document_order() {
        let mut doc = Document::new();
        let body = doc.body();
        let list = doc.insert(body, Element::new("ul").with_id("lista"));
        let a = doc.insert(list, Element::new("li").with_class("item"));
        let b = doc.insert(list, Element::new("li").with_class("item").with_attribute("data-tab", "b"));

        assert_eq!(doc.get_element_by_id("lista"), Some(list));
        assert_eq!(doc.query_class_all("item"), vec![a, b]);
        assert_eq!(doc.query_class("item"), Some(a));
        assert_eq!(doc.query_attribute("data-tab", "b"), Some(b));
    }

    #[test]
    fn test_detached_elements_are_invisible() {
        let mut doc = Document::new();
        let orphan = doc.create_element(Element::new("div").with_id("orphan"));
        assert!(!doc.is_connected(orphan));
        assert_eq!(doc.get_element_by_id("orphan"), None);

        let body = doc.body();
        doc.append_child(body, orphan);
        assert!(doc.is_connected(orphan));

        doc.remove(orphan);
        doc.remove(orphan);
        assert_eq!(doc.get_element_by_id("orphan"), None);
        assert!(doc.children(body).is_empty());
    }

    #[test]
    fn test_class_helpers() {
        let mut doc = Document::new();
        let body = doc.body();
        let node = doc.insert(body, Element::new("div").with_class("toast"));
        doc.add_class(node, "show");
        doc.add_class(node, "show");
        assert_eq!(doc.get(node).unwrap().class_name(), "toast show");
        doc.remove_class(node, "show");
        assert!(!doc.has_class(node, "show"));
    }

    #[test]
    fn test_clear_children() {
        let mut doc = Document::new();
        let body = doc.body();
        let container = doc.insert(body, Element::new("div"));
        let child = doc.insert(container, Element::new("span").with_class("x"));
        doc.clear_children(container);
        assert!(doc.children(container).is_empty());
        assert!(!doc.is_connected(child));
        assert_eq!(doc.query_class("x"), None);
    }

    #[test]
    fn test_removed_slots_are_reused_without_aliasing() {
        let mut doc = Document::new();
        let body = doc.body();
        let first = doc.insert(body, Element::new("div").with_class("toast"));
        doc.insert(first, Element::new("span"));
        let slots = doc.slots.len();

        for _ in 0..50 {
            let toast = doc.query_class("toast").unwrap();
            doc.remove(toast);
            let next = doc.insert(body, Element::new("div").with_class("toast"));
            doc.insert(next, Element::new("span"));
        }
        assert_eq!(doc.slots.len(), slots);
        assert_eq!(doc.free.len(), 0);

        // The first handle is stale even though its slot is in use again
        assert_eq!(doc.get(first), None);
        doc.add_class(first, "show");
        doc.remove(first);
        let current = doc.query_class("toast").unwrap();
        assert!(!doc.has_class(current, "show"));
        assert!(doc.is_connected(current));
    }
}
