//! Horizon Veil - overlay positioning and lifecycle for menus, tooltips and
//! dialogs.
//!
//! The crate computes where a floating element goes relative to the element
//! that opened it, keeps it on screen, stacks it above other open overlays and
//! drives its show/measure/hide lifecycle. All host interaction goes through
//! the [`DomAdapter`] and [`OverlayHost`] traits; [`HeadlessDom`] is an
//! in-memory implementation for tests and non-browser hosts.
//!
//! Overlay state lives in a [`reactive::ReactiveStore`], re-exported from
//! `horizon-veil-core`.
//!
//! # Positioning
//!
//! ```
//! use horizon_veil::{
//!     BoundingRect, Dimensions, GeometrySnapshot, OverlayPositioner, PageMetrics,
//!     PositionerConfig,
//! };
//!
//! let dims = Dimensions::new(
//!     GeometrySnapshot::from_rect(BoundingRect::new(100.0, 200.0, 50.0, 20.0)),
//!     GeometrySnapshot::from_rect(BoundingRect::new(0.0, 0.0, 80.0, 40.0)),
//! );
//! let page = PageMetrics {
//!     page_width: 1000.0,
//!     viewport_height: 800.0,
//!     ..Default::default()
//! };
//!
//! let config = PositionerConfig::new().offset_y(true);
//! let placement = OverlayPositioner::new(&config).compute(&dims, &page);
//! assert_eq!((placement.left, placement.top), (100.0, 220.0));
//! ```
//!
//! Configuration, lengths and geometry (de)serialize with `serde`, camelCase,
//! so hosts can ship them as JSON.

pub use horizon_veil_core as reactive;

pub mod config;
pub mod dom;
mod error;
pub mod geometry;
pub mod headless;
pub mod length;
pub mod overlay;
pub mod positioner;
pub mod stacking;

pub use config::{OverlayOptions, PositionerConfig};
pub use dom::{DomAdapter, ElementRef, ListenerCallback, ListenerId, NoopHost, OverlayHost};
pub use error::{OverlayError, Result};
pub use geometry::{
    BoundingRect, Dimensions, GeometrySnapshot, PageMetrics, ViewportMetrics, parse_css_pixels,
};
pub use headless::HeadlessDom;
pub use length::Length;
pub use overlay::{OverlayBuilder, OverlayController, OverlayPhase, OverlayState};
pub use positioner::{DEFAULT_EDGE_MARGIN, OverlayPositioner, Placement};
pub use stacking::{DEFAULT_STACK_FLOOR, StackingArbiter};
