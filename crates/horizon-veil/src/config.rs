//! Overlay configuration.
//!
//! [`PositionerConfig`] holds the per-overlay alignment flags, offsets and
//! overflow policy consumed by the [`OverlayPositioner`](crate::OverlayPositioner)
//! and [`StackingArbiter`](crate::StackingArbiter). [`OverlayOptions`] holds
//! controller-level settings that rarely change per overlay.
//!
//! Both are built with consuming builder methods:
//!
//! ```
//! use horizon_veil::{Length, PositionerConfig};
//!
//! let config = PositionerConfig::new()
//!     .offset_y(true)
//!     .nudge_top(Length::px(4.0))
//!     .max_width(Length::px(320.0))
//!     .attach("#app");
//!
//! assert!(config.is_attached());
//! ```

use serde::{Deserialize, Serialize};

use crate::length::Length;
use crate::positioner::DEFAULT_EDGE_MARGIN;
use crate::stacking::DEFAULT_STACK_FLOOR;

/// Alignment, offset and overflow settings of one overlay.
///
/// Never mutated by the positioner or the arbiter.
#[derive(Debug, Clone, PartialEq, Default)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionerConfig {
    /// Align the content's bottom edge with the activator's.
    pub top: bool,
    /// Open below the activator (the default direction).
    pub bottom: bool,
    /// Align the content's right edge with the activator's.
    pub left: bool,
    /// Prefer pulling the content left when it overflows on the right.
    pub right: bool,
    /// Position at fixed coordinates instead of against an activator.
    pub absolute: bool,
    /// Let the content extend past the viewport's bottom edge.
    pub allow_overflow: bool,
    /// On vertical overflow, flip above the activator if there is room.
    pub offset_overflow: bool,
    /// Place the content beside the activator instead of over it.
    pub offset_x: bool,
    /// Place the content below (or above) the activator instead of over it.
    pub offset_y: bool,
    pub nudge_top: Option<Length>,
    pub nudge_bottom: Option<Length>,
    pub nudge_left: Option<Length>,
    pub nudge_right: Option<Length>,
    pub nudge_width: Option<Length>,
    pub min_width: Option<Length>,
    pub max_width: Option<Length>,
    /// Absolute-mode x coordinate; falls back to the last activator click.
    pub position_x: Option<f64>,
    /// Absolute-mode y coordinate; falls back to the last activator click.
    pub position_y: Option<f64>,
    /// Selector of the element the content is attached to.
    ///
    /// When set, positions are measured relative to the activator's offset
    /// parent instead of the viewport.
    pub attach: Option<String>,
    /// Explicit z-index; used verbatim when numeric and positive.
    pub z_index: Option<Length>,
}

impl PositionerConfig {
    /// Create a configuration with every flag off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether attach mode is active.
    pub fn is_attached(&self) -> bool {
        self.attach.is_some()
    }

    pub fn top(mut self, enabled: bool) -> Self {
        self.top = enabled;
        self
    }

    pub fn bottom(mut self, enabled: bool) -> Self {
        self.bottom = enabled;
        self
    }

    pub fn left(mut self, enabled: bool) -> Self {
        self.left = enabled;
        self
    }

    pub fn right(mut self, enabled: bool) -> Self {
        self.right = enabled;
        self
    }

    pub fn absolute(mut self, enabled: bool) -> Self {
        self.absolute = enabled;
        self
    }

    pub fn allow_overflow(mut self, enabled: bool) -> Self {
        self.allow_overflow = enabled;
        self
    }

    pub fn offset_overflow(mut self, enabled: bool) -> Self {
        self.offset_overflow = enabled;
        self
    }

    pub fn offset_x(mut self, enabled: bool) -> Self {
        self.offset_x = enabled;
        self
    }

    pub fn offset_y(mut self, enabled: bool) -> Self {
        self.offset_y = enabled;
        self
    }

    pub fn nudge_top(mut self, nudge: impl Into<Length>) -> Self {
        self.nudge_top = Some(nudge.into());
        self
    }

    pub fn nudge_bottom(mut self, nudge: impl Into<Length>) -> Self {
        self.nudge_bottom = Some(nudge.into());
        self
    }

    pub fn nudge_left(mut self, nudge: impl Into<Length>) -> Self {
        self.nudge_left = Some(nudge.into());
        self
    }

    pub fn nudge_right(mut self, nudge: impl Into<Length>) -> Self {
        self.nudge_right = Some(nudge.into());
        self
    }

    pub fn nudge_width(mut self, nudge: impl Into<Length>) -> Self {
        self.nudge_width = Some(nudge.into());
        self
    }

    pub fn min_width(mut self, width: impl Into<Length>) -> Self {
        self.min_width = Some(width.into());
        self
    }

    pub fn max_width(mut self, width: impl Into<Length>) -> Self {
        self.max_width = Some(width.into());
        self
    }

    /// Set fixed absolute-mode coordinates.
    pub fn position(mut self, x: f64, y: f64) -> Self {
        self.position_x = Some(x);
        self.position_y = Some(y);
        self
    }

    /// Attach the content to the element matching `selector`.
    pub fn attach(mut self, selector: impl Into<String>) -> Self {
        self.attach = Some(selector.into());
        self
    }

    pub fn z_index(mut self, z_index: impl Into<Length>) -> Self {
        self.z_index = Some(z_index.into());
        self
    }
}

/// Controller-level settings.
#[derive(Debug, Clone, PartialEq)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlayOptions {
    /// Lowest z-index base an overlay stacks on.
    pub stack_floor: i32,
    /// Gutter kept between the content and the viewport edges, in pixels.
    pub edge_margin: f64,
    /// Defer mounting the content until the first activation.
    pub lazy_content: bool,
    /// Toggle activation when the activator is clicked.
    pub open_on_click: bool,
    /// Deactivate when a click lands outside the activator and content.
    pub close_on_outside_click: bool,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            stack_floor: DEFAULT_STACK_FLOOR,
            edge_margin: DEFAULT_EDGE_MARGIN,
            lazy_content: true,
            open_on_click: true,
            close_on_outside_click: true,
        }
    }
}

impl OverlayOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stack_floor(mut self, floor: i32) -> Self {
        self.stack_floor = floor;
        self
    }

    pub fn edge_margin(mut self, margin: f64) -> Self {
        self.edge_margin = margin;
        self
    }

    pub fn lazy_content(mut self, lazy: bool) -> Self {
        self.lazy_content = lazy;
        self
    }

    pub fn open_on_click(mut self, enabled: bool) -> Self {
        self.open_on_click = enabled;
        self
    }

    pub fn close_on_outside_click(mut self, enabled: bool) -> Self {
        self.close_on_outside_click = enabled;
        self
    }
}
