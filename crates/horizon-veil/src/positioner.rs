//! Overlay position computation.
//!
//! [`OverlayPositioner`] turns an activator/content measurement pair, the
//! page metrics and a [`PositionerConfig`] into the content's `left`/`top`.
//! Every method is pure: identical inputs always yield identical outputs.
//!
//! Computation runs in two stages per axis. The *raw* stage places the content
//! relative to the activator (alignment, offsets, nudges). The *overflow*
//! stage then pulls the result back inside the viewport, keeping an edge
//! margin of [`DEFAULT_EDGE_MARGIN`] pixels unless configured otherwise.
//!
//! # Example
//!
//! ```
//! use horizon_veil::{BoundingRect, Dimensions, GeometrySnapshot, OverlayPositioner, PageMetrics, PositionerConfig};
//!
//! let dims = Dimensions::new(
//!     GeometrySnapshot::from_rect(BoundingRect::new(100.0, 200.0, 50.0, 20.0)),
//!     GeometrySnapshot::from_rect(BoundingRect::new(0.0, 0.0, 80.0, 40.0)),
//! );
//! let page = PageMetrics { page_width: 1000.0, viewport_height: 800.0, ..Default::default() };
//!
//! let config = PositionerConfig::new();
//! let placement = OverlayPositioner::new(&config).compute(&dims, &page);
//! assert_eq!(placement.left, 100.0);
//! ```

use horizon_veil_core::logging::targets;

use crate::config::PositionerConfig;
use crate::geometry::{Dimensions, PageMetrics};
use crate::length::number_or_zero;

/// Default gutter between overlay content and the viewport edges.
pub const DEFAULT_EDGE_MARGIN: f64 = 12.0;

/// A computed content position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Placement {
    pub left: f64,
    pub top: f64,
}

/// Computes overlay positions for one configuration.
#[derive(Debug, Clone, Copy)]
pub struct OverlayPositioner<'a> {
    config: &'a PositionerConfig,
    edge_margin: f64,
}

impl<'a> OverlayPositioner<'a> {
    /// Create a positioner with the default edge margin.
    pub fn new(config: &'a PositionerConfig) -> Self {
        Self {
            config,
            edge_margin: DEFAULT_EDGE_MARGIN,
        }
    }

    /// Use a different edge margin.
    pub fn with_edge_margin(mut self, edge_margin: f64) -> Self {
        self.edge_margin = edge_margin;
        self
    }

    /// Compute both coordinates.
    pub fn compute(&self, dims: &Dimensions, page: &PageMetrics) -> Placement {
        let placement = Placement {
            left: self.compute_left(dims, page),
            top: self.compute_top(dims, page),
        };
        tracing::trace!(
            target: targets::POSITIONER,
            left = placement.left,
            top = placement.top,
            "computed overlay placement"
        );
        placement
    }

    /// The content's left edge, overflow-corrected.
    pub fn compute_left(&self, dims: &Dimensions, page: &PageMetrics) -> f64 {
        let menu_width = self.menu_width(dims, page);
        self.clamp_x_overflow(self.raw_left(dims), menu_width, page)
    }

    /// The content's top edge, overflow-corrected.
    pub fn compute_top(&self, dims: &Dimensions, page: &PageMetrics) -> f64 {
        self.clamp_y_overflow(self.raw_top(dims, page.page_y_offset), dims, page)
    }

    /// The content's left edge before overflow correction.
    pub fn raw_left(&self, dims: &Dimensions) -> f64 {
        let config = self.config;
        let activator = &dims.activator;
        let content = &dims.content;

        let base = if config.is_attached() {
            activator.offset_left
        } else {
            activator.left()
        };
        let min_width = activator.width().max(content.width());

        let mut left = if config.left {
            base - (min_width - activator.width())
        } else {
            base
        };

        if config.offset_x {
            let max_width = match config.max_width.as_ref() {
                Some(length) => match length.as_number() {
                    Some(max_width) => activator.width().min(max_width),
                    None => activator.width(),
                },
                // Without a max width the shift collapses to zero when
                // aligned left.
                None => 0.0,
            };
            left += if config.left {
                -max_width
            } else {
                activator.width()
            };
        }

        left -= number_or_zero(config.nudge_left.as_ref());
        left += number_or_zero(config.nudge_right.as_ref());
        left
    }

    /// The content's top edge before overflow correction.
    pub fn raw_top(&self, dims: &Dimensions, page_y_offset: f64) -> f64 {
        let config = self.config;
        let activator = &dims.activator;
        let content = &dims.content;

        let mut top = 0.0;
        if config.top {
            top += activator.height() - content.height();
        }

        if config.is_attached() {
            top += activator.offset_top;
        } else {
            top += activator.top() + page_y_offset;
        }

        if config.offset_y {
            top += if config.top {
                -activator.height()
            } else {
                activator.height()
            };
        }

        top -= number_or_zero(config.nudge_top.as_ref());
        top += number_or_zero(config.nudge_bottom.as_ref());
        top
    }

    /// Keep `left` inside the page horizontally, then shift by the page's
    /// horizontal scroll.
    pub fn clamp_x_overflow(&self, left: f64, menu_width: f64, page: &PageMetrics) -> f64 {
        let x_overflow = left + menu_width - page.page_width + self.edge_margin;

        let left = if (!self.config.left || self.config.right) && x_overflow > 0.0 {
            (left - x_overflow).max(0.0)
        } else {
            left.max(self.edge_margin)
        };

        left + page.page_x_offset
    }

    /// Keep `top` inside the viewport vertically.
    pub fn clamp_y_overflow(&self, top: f64, dims: &Dimensions, page: &PageMetrics) -> f64 {
        let config = self.config;
        let margin = self.edge_margin;
        let content_height = dims.content.height();
        let activator_top = dims.activator.top();

        let to_top = page.page_y_offset + page.viewport_height;
        let total_height = top + content_height;
        let is_overflowing = to_top < total_height;

        let top = if is_overflowing && config.offset_overflow && activator_top > content_height {
            page.page_y_offset + (activator_top - content_height)
        } else if is_overflowing && !config.allow_overflow {
            to_top - content_height - margin
        } else if top < page.page_y_offset && !config.allow_overflow {
            page.page_y_offset + margin
        } else {
            top
        };

        top.max(margin)
    }

    /// Minimum content width: the activator's width plus `nudge_width`, or
    /// the configured `min_width` if larger, capped to fit the page.
    pub fn calculated_min_width(&self, dims: &Dimensions, page: &PageMetrics) -> f64 {
        let from_activator =
            dims.activator.width() + number_or_zero(self.config.nudge_width.as_ref());
        let min_width = number_or_zero(self.config.min_width.as_ref()).max(from_activator);

        let available = page.page_width - 2.0 * self.edge_margin;
        if available > 0.0 {
            min_width.min(available)
        } else {
            min_width
        }
    }

    /// Maximum content width, or `None` for `auto`.
    pub fn calculated_max_width(&self) -> Option<f64> {
        self.config.max_width.as_ref().and_then(|length| length.as_number())
    }

    /// The width used for horizontal overflow correction.
    pub fn menu_width(&self, dims: &Dimensions, page: &PageMetrics) -> f64 {
        dims.content.width().max(self.calculated_min_width(dims, page))
    }
}
