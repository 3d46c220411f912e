//! Geometry snapshots of elements and the viewport.
//!
//! All values are CSS pixels. Snapshots are plain values: a new measurement
//! always produces a new snapshot and never mutates an old one.

use serde::{Deserialize, Serialize};

// ============================================================================
// Element Geometry
// ============================================================================

/// An element's bounding client rect in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoundingRect {
    /// Distance from the viewport's top edge to the element's top edge.
    pub top: f64,
    /// Distance from the viewport's left edge to the element's left edge.
    pub left: f64,
    /// Distance from the viewport's top edge to the element's bottom edge.
    pub bottom: f64,
    /// Distance from the viewport's left edge to the element's right edge.
    pub right: f64,
    /// Element width.
    pub width: f64,
    /// Element height.
    pub height: f64,
}

impl BoundingRect {
    /// Create a rect from its origin and size.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            bottom: top + height,
            right: left + width,
            width,
            height,
        }
    }

    /// A zero-size rect at the given point.
    pub fn point(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0, 0.0)
    }
}

/// An immutable measurement of one element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeometrySnapshot {
    /// The element's bounding rect.
    pub rect: BoundingRect,
    /// Top offset relative to the nearest positioned ancestor.
    pub offset_top: f64,
    /// Left offset relative to the nearest positioned ancestor.
    pub offset_left: f64,
    /// Scroll extent of the element.
    pub scroll_height: f64,
}

impl GeometrySnapshot {
    /// A snapshot of an element with the given rect and no offset metadata.
    pub fn from_rect(rect: BoundingRect) -> Self {
        Self {
            rect,
            ..Self::default()
        }
    }

    /// The zero-size snapshot used in absolute mode, anchored at `(x, y)`.
    pub fn absolute(x: f64, y: f64) -> Self {
        Self {
            rect: BoundingRect::point(x, y),
            offset_top: y,
            offset_left: x,
            scroll_height: 0.0,
        }
    }

    /// A copy of this snapshot with different offset metadata.
    pub fn with_offsets(self, offset_left: f64, offset_top: f64) -> Self {
        Self {
            offset_left,
            offset_top,
            ..self
        }
    }

    /// A copy of this snapshot with the rect's horizontal edges replaced.
    pub fn with_horizontal_edges(self, left: Option<f64>, right: Option<f64>) -> Self {
        let mut rect = self.rect;
        if let Some(left) = left {
            rect.left = left;
        }
        if let Some(right) = right {
            rect.right = right;
        }
        Self { rect, ..self }
    }

    pub fn top(&self) -> f64 {
        self.rect.top
    }

    pub fn left(&self) -> f64 {
        self.rect.left
    }

    pub fn width(&self) -> f64 {
        self.rect.width
    }

    pub fn height(&self) -> f64 {
        self.rect.height
    }
}

/// The activator and content measurements of one overlay.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dimensions {
    /// The element the overlay is positioned against.
    pub activator: GeometrySnapshot,
    /// The floating content itself.
    pub content: GeometrySnapshot,
}

impl Dimensions {
    pub fn new(activator: GeometrySnapshot, content: GeometrySnapshot) -> Self {
        Self { activator, content }
    }
}

// ============================================================================
// Viewport Geometry
// ============================================================================

/// Window and document metrics as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewportMetrics {
    pub inner_height: f64,
    pub inner_width: f64,
    pub page_x_offset: f64,
    pub page_y_offset: f64,
    pub client_height: f64,
    pub client_width: f64,
    pub scroll_left: f64,
    pub scroll_top: f64,
}

impl ViewportMetrics {
    /// Vertical scroll offset, preferring the window's over the document's.
    pub fn offset_top(&self) -> f64 {
        if self.page_y_offset > 0.0 {
            self.page_y_offset
        } else {
            self.scroll_top
        }
    }

    /// Horizontal scroll offset, preferring the window's over the document's.
    pub fn offset_left(&self) -> f64 {
        if self.page_x_offset > 0.0 {
            self.page_x_offset
        } else {
            self.scroll_left
        }
    }

    /// Visible height, falling back to the document's client height.
    pub fn viewport_height(&self) -> f64 {
        if self.inner_height > 0.0 {
            self.inner_height
        } else {
            self.client_height
        }
    }
}

/// The page-level inputs of position computation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageMetrics {
    /// Width available to overlays (the document's client width).
    pub page_width: f64,
    /// Horizontal scroll offset.
    pub page_x_offset: f64,
    /// Vertical scroll offset; zero when the activator is fixed-positioned.
    pub page_y_offset: f64,
    /// Visible viewport height.
    pub viewport_height: f64,
}

impl PageMetrics {
    /// Derive page metrics from a viewport query.
    ///
    /// A fixed-positioned activator does not move with the page, so its
    /// overlay ignores the vertical scroll offset.
    pub fn from_viewport(viewport: &ViewportMetrics, activator_fixed: bool) -> Self {
        Self {
            page_width: viewport.client_width,
            page_x_offset: viewport.offset_left(),
            page_y_offset: if activator_fixed {
                0.0
            } else {
                viewport.offset_top()
            },
            viewport_height: viewport.viewport_height(),
        }
    }
}

/// Parse a computed-style pixel length such as `"12px"` or `"-4"`.
///
/// Only whole pixel values are accepted.
pub fn parse_css_pixels(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim_end();
    number.parse::<i32>().ok().map(f64::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let rect = BoundingRect::new(100.0, 200.0, 50.0, 20.0);
        assert_eq!(rect.right, 150.0);
        assert_eq!(rect.bottom, 220.0);

        let point = BoundingRect::point(7.0, 9.0);
        assert_eq!((point.left, point.right, point.top, point.bottom), (7.0, 7.0, 9.0, 9.0));
        assert_eq!(point.width, 0.0);
    }

    #[test]
    fn test_absolute_snapshot() {
        let snapshot = GeometrySnapshot::absolute(30.0, 40.0);
        assert_eq!(snapshot.left(), 30.0);
        assert_eq!(snapshot.top(), 40.0);
        assert_eq!(snapshot.offset_left, 30.0);
        assert_eq!(snapshot.offset_top, 40.0);
        assert_eq!(snapshot.width(), 0.0);
        assert_eq!(snapshot.height(), 0.0);
    }

    #[test]
    fn test_snapshot_copies_are_independent() {
        let original = GeometrySnapshot::from_rect(BoundingRect::new(10.0, 10.0, 5.0, 5.0));
        let moved = original.with_horizontal_edges(Some(3.0), None).with_offsets(1.0, 2.0);

        assert_eq!(original.left(), 10.0);
        assert_eq!(moved.left(), 3.0);
        assert_eq!(moved.rect.right, 15.0);
        assert_eq!((moved.offset_left, moved.offset_top), (1.0, 2.0));
    }

    #[test]
    fn test_viewport_fallbacks() {
        let viewport = ViewportMetrics {
            inner_height: 0.0,
            client_height: 700.0,
            page_y_offset: 0.0,
            scroll_top: 120.0,
            page_x_offset: 15.0,
            scroll_left: 90.0,
            ..Default::default()
        };
        assert_eq!(viewport.viewport_height(), 700.0);
        assert_eq!(viewport.offset_top(), 120.0);
        assert_eq!(viewport.offset_left(), 15.0);
    }

    #[test]
    fn test_page_metrics_ignore_scroll_for_fixed_activator() {
        let viewport = ViewportMetrics {
            inner_height: 800.0,
            client_width: 1024.0,
            page_y_offset: 300.0,
            ..Default::default()
        };

        let scrolled = PageMetrics::from_viewport(&viewport, false);
        assert_eq!(scrolled.page_width, 1024.0);
        assert_eq!(scrolled.page_y_offset, 300.0);
        assert_eq!(scrolled.viewport_height, 800.0);

        let fixed = PageMetrics::from_viewport(&viewport, true);
        assert_eq!(fixed.page_y_offset, 0.0);
    }

    #[test]
    fn test_parse_css_pixels() {
        assert_eq!(parse_css_pixels("12"), Some(12.0));
        assert_eq!(parse_css_pixels("12px"), Some(12.0));
        assert_eq!(parse_css_pixels(" -4px "), Some(-4.0));
        assert_eq!(parse_css_pixels("1.5px"), None);
        assert_eq!(parse_css_pixels("auto"), None);
        assert_eq!(parse_css_pixels(""), None);
    }
}
