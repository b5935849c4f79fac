//! Minimal document model the page-side code draws into: positioned elements
//! with inline styles and text content, pointer listeners, and removal
//! observers.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::geometry::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    MouseDown,
    MouseMove,
    MouseUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Auxiliary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub button: MouseButton,
    pub x: f64,
    pub y: f64,
}

impl PointerEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::MouseDown, x, y)
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::MouseMove, x, y)
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::MouseUp, x, y)
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    fn new(kind: PointerEventKind, x: f64, y: f64) -> Self {
        Self {
            kind,
            button: MouseButton::Primary,
            x,
            y,
        }
    }
}

#[derive(Debug, Clone)]
struct Element {
    dom_id: Option<String>,
    style: BTreeMap<String, String>,
    text: String,
    dismiss_on_click: bool,
}

#[derive(Default)]
struct PageInner {
    next_id: u64,
    elements: BTreeMap<ElementId, Element>,
    listeners: HashMap<ElementId, Vec<PointerEventKind>>,
    /// Elements whose removal is being watched.
    observers: Vec<ElementId>,
}

/// Shared handle to the document. Clones refer to the same page.
#[derive(Clone, Default)]
pub struct Page {
    inner: Arc<Mutex<PageInner>>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PageInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends a new element to the body.
    pub fn create_element(&self, dom_id: Option<&str>, style: &[(&str, &str)]) -> ElementId {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = ElementId(inner.next_id);
        inner.elements.insert(
            id,
            Element {
                dom_id: dom_id.map(str::to_string),
                style: style
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                text: String::new(),
                dismiss_on_click: false,
            },
        );
        id
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.lock().elements.contains_key(&id)
    }

    pub fn get_by_dom_id(&self, dom_id: &str) -> Option<ElementId> {
        self.lock()
            .elements
            .iter()
            .find(|(_, el)| el.dom_id.as_deref() == Some(dom_id))
            .map(|(id, _)| *id)
    }

    pub fn count_by_dom_id(&self, dom_id: &str) -> usize {
        self.lock()
            .elements
            .values()
            .filter(|el| el.dom_id.as_deref() == Some(dom_id))
            .count()
    }

    pub fn element_count(&self) -> usize {
        self.lock().elements.len()
    }

    pub fn set_style(&self, id: ElementId, key: &str, value: impl Into<String>) {
        if let Some(el) = self.lock().elements.get_mut(&id) {
            el.style.insert(key.to_string(), value.into());
        }
    }

    pub fn style(&self, id: ElementId, key: &str) -> Option<String> {
        self.lock()
            .elements
            .get(&id)
            .and_then(|el| el.style.get(key).cloned())
    }

    /// Text-node assignment; the text is never interpreted as markup.
    pub fn set_text_content(&self, id: ElementId, text: &str) {
        if let Some(el) = self.lock().elements.get_mut(&id) {
            el.text = text.to_string();
        }
    }

    pub fn text_content(&self, id: ElementId) -> Option<String> {
        self.lock().elements.get(&id).map(|el| el.text.clone())
    }

    pub fn inner_html(&self, id: ElementId) -> Option<String> {
        self.lock()
            .elements
            .get(&id)
            .map(|el| escape_html(&el.text))
    }

    /// Box of a fixed-position element, read back from its inline style.
    pub fn bounding_rect(&self, id: ElementId) -> Option<Rect> {
        let inner = self.lock();
        let el = inner.elements.get(&id)?;
        let px = |key: &str| {
            el.style
                .get(key)
                .and_then(|v| v.trim_end_matches("px").parse::<f64>().ok())
                .unwrap_or(0.0)
        };
        Some(Rect {
            x: px("left"),
            y: px("top"),
            width: px("width"),
            height: px("height"),
        })
    }

    pub fn set_dismiss_on_click(&self, id: ElementId, dismiss: bool) {
        if let Some(el) = self.lock().elements.get_mut(&id) {
            el.dismiss_on_click = dismiss;
        }
    }

    /// Delivers a click. Returns true if the element dismissed itself.
    pub fn click(&self, id: ElementId) -> bool {
        let dismiss = self
            .lock()
            .elements
            .get(&id)
            .map(|el| el.dismiss_on_click)
            .unwrap_or(false);
        dismiss && self.remove(id)
    }

    pub fn add_listener(&self, id: ElementId, kind: PointerEventKind) {
        self.lock().listeners.entry(id).or_default().push(kind);
    }

    pub fn has_listener(&self, id: ElementId, kind: PointerEventKind) -> bool {
        self.lock()
            .listeners
            .get(&id)
            .is_some_and(|kinds| kinds.contains(&kind))
    }

    pub fn listener_count(&self, id: ElementId) -> usize {
        self.lock().listeners.get(&id).map_or(0, Vec::len)
    }

    /// Watches the body for removal of `target`. When it goes, its listeners
    /// are deregistered and the observer disconnects itself.
    pub fn watch_removal(&self, target: ElementId) {
        self.lock().observers.push(target);
    }

    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    /// Detaches an element from the body. Returns false if it was not attached.
    pub fn remove(&self, id: ElementId) -> bool {
        let mut inner = self.lock();
        if inner.elements.remove(&id).is_none() {
            return false;
        }

        let before = inner.observers.len();
        inner.observers.retain(|target| *target != id);
        if inner.observers.len() != before {
            inner.listeners.remove(&id);
        }
        true
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_escaped_when_serialized() {
        let page = Page::new();
        let id = page.create_element(None, &[]);
        page.set_text_content(id, "<script>alert('x')</script> & more");

        assert_eq!(
            page.text_content(id).unwrap(),
            "<script>alert('x')</script> & more"
        );
        assert_eq!(
            page.inner_html(id).unwrap(),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; more"
        );
    }

    #[test]
    fn removal_observer_drops_listeners_and_disconnects() {
        let page = Page::new();
        let overlay = page.create_element(Some("overlay"), &[]);
        page.add_listener(overlay, PointerEventKind::MouseDown);
        page.add_listener(overlay, PointerEventKind::MouseUp);
        page.watch_removal(overlay);

        assert_eq!(page.listener_count(overlay), 2);
        assert!(page.remove(overlay));
        assert_eq!(page.listener_count(overlay), 0);
        assert_eq!(page.observer_count(), 0);
        assert!(!page.remove(overlay));
    }

    #[test]
    fn unrelated_removal_leaves_observer_in_place() {
        let page = Page::new();
        let overlay = page.create_element(Some("overlay"), &[]);
        let other = page.create_element(None, &[]);
        page.add_listener(overlay, PointerEventKind::MouseMove);
        page.watch_removal(overlay);

        page.remove(other);
        assert_eq!(page.observer_count(), 1);
        assert!(page.has_listener(overlay, PointerEventKind::MouseMove));
    }

    #[test]
    fn click_only_removes_dismissable_elements() {
        let page = Page::new();
        let sticky = page.create_element(None, &[]);
        let panel = page.create_element(None, &[]);
        page.set_dismiss_on_click(panel, true);

        assert!(!page.click(sticky));
        assert!(page.contains(sticky));
        assert!(page.click(panel));
        assert!(!page.contains(panel));
    }

    #[test]
    fn bounding_rect_reads_pixel_styles() {
        let page = Page::new();
        let id = page.create_element(
            None,
            &[("left", "10px"), ("top", "20px"), ("width", "30px"), ("height", "40px")],
        );
        assert_eq!(
            page.bounding_rect(id).unwrap(),
            Rect {
                x: 10.0,
                y: 20.0,
                width: 30.0,
                height: 40.0
            }
        );
    }
}
