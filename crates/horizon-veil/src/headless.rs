//! An in-memory [`DomAdapter`].
//!
//! [`HeadlessDom`] stands in for a browser document wherever there is none:
//! server-side pre-rendering, native hosts that do their own layout, and
//! tests. Element geometry, styles and viewport metrics are set directly by
//! the host; listeners are fired on demand with [`HeadlessDom::trigger_resize`]
//! and [`HeadlessDom::trigger_outside_click`].
//!
//! A `HeadlessDom` created without a viewport behaves like a non-interactive
//! context: every measurement returns `None`.

use std::collections::HashMap;

use parking_lot::Mutex;
use slotmap::SlotMap;

use crate::dom::{DomAdapter, ElementRef, ListenerCallback, ListenerId};
use crate::error::{OverlayError, Result};
use crate::geometry::{GeometrySnapshot, ViewportMetrics};

#[derive(Debug, Clone, Default)]
struct HeadlessElement {
    geometry: GeometrySnapshot,
    styles: HashMap<String, String>,
    fixed: bool,
    z_index: Option<i32>,
    detach_count: usize,
}

struct OutsideClickListener {
    selectors: Vec<ElementRef>,
    callback: ListenerCallback,
}

#[derive(Default)]
struct HeadlessState {
    viewport: Option<ViewportMetrics>,
    elements: HashMap<ElementRef, HeadlessElement>,
    resize_listeners: SlotMap<ListenerId, ListenerCallback>,
    outside_click_listeners: SlotMap<ListenerId, OutsideClickListener>,
    measurements: usize,
}

/// An in-memory document.
///
/// Callbacks are always invoked with the internal lock released.
#[derive(Default)]
pub struct HeadlessDom {
    state: Mutex<HeadlessState>,
}

impl HeadlessDom {
    /// Create a document with no window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document with the given viewport.
    pub fn with_viewport(viewport: ViewportMetrics) -> Self {
        let dom = Self::new();
        dom.set_viewport(Some(viewport));
        dom
    }

    /// Replace the viewport; `None` removes the window.
    pub fn set_viewport(&self, viewport: Option<ViewportMetrics>) {
        self.state.lock().viewport = viewport;
    }

    /// Insert or move an element.
    pub fn set_element(&self, element: impl Into<ElementRef>, geometry: GeometrySnapshot) {
        self.state
            .lock()
            .elements
            .entry(element.into())
            .or_default()
            .geometry = geometry;
    }

    /// Set a computed style value of an existing element.
    pub fn set_style(&self, element: &ElementRef, property: &str, value: &str) {
        if let Some(el) = self.state.lock().elements.get_mut(element) {
            el.styles.insert(property.to_owned(), value.to_owned());
        }
    }

    /// Mark an existing element as fixed-positioned.
    pub fn set_fixed(&self, element: &ElementRef, fixed: bool) {
        if let Some(el) = self.state.lock().elements.get_mut(element) {
            el.fixed = fixed;
        }
    }

    /// Register the z-index of an overlay that is not managed by this engine.
    pub fn set_z_index(&self, element: &ElementRef, z_index: Option<i32>) {
        self.apply_z_index(element, z_index);
    }

    /// Remove an element.
    pub fn remove_element(&self, element: &ElementRef) -> bool {
        self.state.lock().elements.remove(element).is_some()
    }

    /// Whether the element exists.
    pub fn contains(&self, element: &ElementRef) -> bool {
        self.state.lock().elements.contains_key(element)
    }

    /// The z-index applied to an element, if it is an open overlay.
    pub fn z_index_of(&self, element: &ElementRef) -> Option<i32> {
        self.state
            .lock()
            .elements
            .get(element)
            .and_then(|el| el.z_index)
    }

    /// How many times the element was detached from its attach point.
    pub fn detach_count(&self, element: &ElementRef) -> usize {
        self.state
            .lock()
            .elements
            .get(element)
            .map_or(0, |el| el.detach_count)
    }

    /// Total successful element measurements so far.
    pub fn measurement_count(&self) -> usize {
        self.state.lock().measurements
    }

    pub fn resize_listener_count(&self) -> usize {
        self.state.lock().resize_listeners.len()
    }

    pub fn outside_click_listener_count(&self) -> usize {
        self.state.lock().outside_click_listeners.len()
    }

    /// Fire every resize listener.
    pub fn trigger_resize(&self) {
        let callbacks: Vec<ListenerCallback> =
            self.state.lock().resize_listeners.values().cloned().collect();
        for callback in callbacks {
            callback();
        }
    }

    /// Simulate a click outside every registered selector set.
    pub fn trigger_outside_click(&self) {
        let callbacks: Vec<ListenerCallback> = self
            .state
            .lock()
            .outside_click_listeners
            .values()
            .map(|listener| listener.callback.clone())
            .collect();
        for callback in callbacks {
            callback();
        }
    }
}

impl DomAdapter for HeadlessDom {
    fn measure_element(&self, element: &ElementRef) -> Option<GeometrySnapshot> {
        let mut state = self.state.lock();
        state.viewport?;
        let geometry = state.elements.get(element).map(|el| el.geometry)?;
        state.measurements += 1;
        Some(geometry)
    }

    fn measure_styles(&self, element: &ElementRef, properties: &[&str]) -> HashMap<String, String> {
        let state = self.state.lock();
        let Some(el) = state.elements.get(element) else {
            return HashMap::new();
        };
        properties
            .iter()
            .filter_map(|property| {
                el.styles
                    .get(*property)
                    .map(|value| ((*property).to_owned(), value.clone()))
            })
            .collect()
    }

    fn query_window_and_document(&self) -> Option<ViewportMetrics> {
        self.state.lock().viewport
    }

    fn is_element_fixed_positioned(&self, selector: &str) -> bool {
        self.state
            .lock()
            .elements
            .iter()
            .any(|(element, el)| element.selector() == selector && el.fixed)
    }

    fn max_z_index_among_open_overlays(&self, excluding: &[ElementRef]) -> i32 {
        self.state
            .lock()
            .elements
            .iter()
            .filter(|(element, _)| !excluding.contains(element))
            .filter_map(|(_, el)| el.z_index)
            .max()
            .unwrap_or(0)
    }

    fn add_resize_listener(&self, callback: ListenerCallback) -> ListenerId {
        self.state.lock().resize_listeners.insert(callback)
    }

    fn remove_resize_listener(&self, id: ListenerId) -> bool {
        self.state.lock().resize_listeners.remove(id).is_some()
    }

    fn add_outside_click_listener(&self, selectors: &[ElementRef], callback: ListenerCallback) -> ListenerId {
        self.state
            .lock()
            .outside_click_listeners
            .insert(OutsideClickListener {
                selectors: selectors.to_vec(),
                callback,
            })
    }

    fn remove_outside_click_listener(&self, selectors: &[ElementRef]) {
        self.state
            .lock()
            .outside_click_listeners
            .retain(|_, listener| listener.selectors != selectors);
    }

    fn detach_and_remove_element(&self, element: &ElementRef, _attach: Option<&str>) -> Result<()> {
        // The host re-renders content while it is shown, so the element's
        // geometry record outlives the detach.
        match self.state.lock().elements.get_mut(element) {
            Some(el) => {
                el.detach_count += 1;
                el.z_index = None;
                Ok(())
            }
            None => Err(OverlayError::ElementMissing(element.clone())),
        }
    }

    fn apply_z_index(&self, element: &ElementRef, z_index: Option<i32>) {
        if let Some(el) = self.state.lock().elements.get_mut(element) {
            el.z_index = z_index;
        }
    }
}

impl std::fmt::Debug for HeadlessDom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("HeadlessDom")
            .field("has_window", &state.viewport.is_some())
            .field("elements", &state.elements.len())
            .field("resize_listeners", &state.resize_listeners.len())
            .field("outside_click_listeners", &state.outside_click_listeners.len())
            .finish()
    }
}

static_assertions::assert_impl_all!(HeadlessDom: Send, Sync);
