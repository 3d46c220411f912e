//! Host collaborator interfaces.
//!
//! The overlay engine never touches a real document. Everything it needs from
//! the host (measurements, viewport metrics, global listeners, element
//! removal) goes through a [`DomAdapter`], and everything it asks of the
//! rendering layer goes through an [`OverlayHost`].
//!
//! Window-level listeners are shared by every overlay on the page. Each
//! registration returns a [`ListenerId`] token which its owner must hand back
//! to release it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use slotmap::new_key_type;

use crate::error::Result;
use crate::geometry::{GeometrySnapshot, ViewportMetrics};

new_key_type! {
    /// Registration token of a window-level listener.
    pub struct ListenerId;
}

/// A window-level event callback.
pub type ListenerCallback = Arc<dyn Fn() + Send + Sync>;

/// A reference to a host element by selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(Arc<str>);

impl ElementRef {
    /// Refer to the element matching `selector`.
    pub fn new(selector: impl Into<Arc<str>>) -> Self {
        Self(selector.into())
    }

    /// The element's selector.
    pub fn selector(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementRef {
    fn from(selector: &str) -> Self {
        Self::new(selector)
    }
}

/// Geometry and event primitives provided by the host document.
///
/// Methods are called from the UI thread only and never while the caller
/// holds one of its own locks, so implementations may call back into the
/// overlay engine from listener callbacks.
pub trait DomAdapter: Send + Sync {
    /// Measure an element; `None` if it is absent or there is no window.
    fn measure_element(&self, element: &ElementRef) -> Option<GeometrySnapshot>;

    /// Read computed style values of an element.
    ///
    /// Missing properties are simply absent from the result.
    fn measure_styles(&self, element: &ElementRef, properties: &[&str]) -> HashMap<String, String>;

    /// Query window and document metrics; `None` without a windowing
    /// environment.
    fn query_window_and_document(&self) -> Option<ViewportMetrics>;

    /// Whether the element matching `selector` (or an ancestor) is
    /// fixed-positioned.
    fn is_element_fixed_positioned(&self, selector: &str) -> bool;

    /// Highest z-index among open menus and dialogs, ignoring `excluding`.
    fn max_z_index_among_open_overlays(&self, excluding: &[ElementRef]) -> i32;

    /// Subscribe to window resize events.
    fn add_resize_listener(&self, callback: ListenerCallback) -> ListenerId;

    /// Release a resize subscription. Returns `false` if it was not found.
    fn remove_resize_listener(&self, id: ListenerId) -> bool;

    /// Subscribe to clicks landing outside every element in `selectors`.
    fn add_outside_click_listener(&self, selectors: &[ElementRef], callback: ListenerCallback) -> ListenerId;

    /// Release every outside-click subscription registered for `selectors`.
    fn remove_outside_click_listener(&self, selectors: &[ElementRef]);

    /// Detach an element from its attach point and remove it.
    ///
    /// Fails if the element is already gone.
    fn detach_and_remove_element(&self, element: &ElementRef, attach: Option<&str>) -> Result<()>;

    /// Apply (or with `None`, clear) the z-index of an open overlay's content.
    fn apply_z_index(&self, _element: &ElementRef, _z_index: Option<i32>) {}
}

/// Hooks into the rendering layer that owns an overlay.
///
/// Every hook defaults to a no-op.
pub trait OverlayHost: Send + Sync {
    /// Overlay state changed; the host should re-render.
    fn request_render(&self) {}

    /// Lazy content was just mounted for the first time.
    fn after_show_content(&self) {}

    /// Move the floating content node to its attach point (or the document
    /// root when `attach` is `None`).
    fn move_content_to(&self, _attach: Option<&str>) {}
}

/// An [`OverlayHost`] that ignores every hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHost;

impl OverlayHost for NoopHost {}
