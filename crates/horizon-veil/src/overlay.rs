//! Overlay lifecycle controller.
//!
//! [`OverlayController`] drives a floating element (menu, tooltip, dialog)
//! through its show/measure/hide cycle:
//!
//! ```text
//!            activate                      measured
//!  Closed ─────────────► Opening ──────────────────────► Open
//!    ▲                      │                              │
//!    └──────────────────────┴──────── deactivate ──────────┘
//! ```
//!
//! The first activation *boots* the overlay: content is mounted lazily on the
//! next UI cycle, measured, and only then marked active. Measurement results
//! arrive one cycle after they are requested; a result whose request was
//! overtaken by a deactivation (or any later activation) is discarded.
//!
//! All reactive state lives in the controller's [`ReactiveStore`] under the
//! names in [`props`], so rendering collaborators can watch it.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_veil::reactive::UiDispatcher;
//! use horizon_veil::{BoundingRect, GeometrySnapshot, HeadlessDom, OverlayController, ViewportMetrics};
//!
//! let dom = Arc::new(HeadlessDom::with_viewport(ViewportMetrics {
//!     inner_height: 800.0,
//!     client_width: 1000.0,
//!     ..Default::default()
//! }));
//! dom.set_element("#activator", GeometrySnapshot::from_rect(BoundingRect::new(100.0, 200.0, 50.0, 20.0)));
//! dom.set_element("#menu", GeometrySnapshot::from_rect(BoundingRect::new(0.0, 0.0, 80.0, 40.0)));
//!
//! let dispatcher = Arc::new(UiDispatcher::new());
//! let menu = OverlayController::builder("#menu", dom.clone(), dispatcher.clone())
//!     .activator("#activator")
//!     .build()?;
//!
//! menu.set_active(true)?;
//! assert!(!menu.is_active()); // boots on the next cycles
//! dispatcher.run_until_idle(8);
//!
//! assert!(menu.is_active());
//! assert_eq!(menu.left()?, 100.0);
//! assert_eq!(menu.internal_z_index(), 8);
//! # Ok::<(), horizon_veil::OverlayError>(())
//! ```

use std::sync::{Arc, Weak};

use horizon_veil_core::logging::{span_names, targets};
use horizon_veil_core::{Dependencies, OwnerType, PerfSpan, ReactiveStore, UiDispatcher};
use parking_lot::{Mutex, RwLock};

use crate::config::{OverlayOptions, PositionerConfig};
use crate::dom::{DomAdapter, ElementRef, ListenerId, NoopHost, OverlayHost};
use crate::error::Result;
use crate::geometry::{Dimensions, GeometrySnapshot, PageMetrics, ViewportMetrics, parse_css_pixels};
use crate::positioner::OverlayPositioner;
use crate::stacking::StackingArbiter;

/// Names of the reactive cells in a controller's store.
pub mod props {
    /// `bool`: whether the overlay is shown.
    pub const IS_ACTIVE: &str = "IsActive";
    /// `bool`: whether the content node is present in the render tree.
    pub const SHOW_CONTENT: &str = "ShowContent";
    /// `i32`: the z-index assigned by the last measurement.
    pub const INTERNAL_Z_INDEX: &str = "InternalZIndex";
    /// [`Dimensions`](crate::Dimensions): the last activator/content measurement.
    pub const DIMENSIONS: &str = "Dimensions";
    /// [`PageMetrics`](crate::PageMetrics): the last page measurement.
    pub const PAGE_METRICS: &str = "PageMetrics";
    /// `u64`: bumped whenever the positioner configuration changes.
    pub const CONFIG_REVISION: &str = "ConfigRevision";
    /// `f64`: computed content left.
    pub const COMPUTED_LEFT: &str = "ComputedLeft";
    /// `f64`: computed content top.
    pub const COMPUTED_TOP: &str = "ComputedTop";

    pub(crate) const ALL: &[&str] = &[
        IS_ACTIVE,
        SHOW_CONTENT,
        INTERNAL_Z_INDEX,
        DIMENSIONS,
        PAGE_METRICS,
        CONFIG_REVISION,
        COMPUTED_LEFT,
        COMPUTED_TOP,
    ];
}

const MARGIN_LEFT: &str = "margin-left";
const MARGIN_RIGHT: &str = "margin-right";

/// Lifecycle phase of an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayPhase {
    #[default]
    Closed,
    /// Activated; waiting for content to mount and be measured.
    Opening,
    /// Measured, positioned and visible.
    Open,
}

/// A point-in-time view of an overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayState {
    pub phase: OverlayPhase,
    pub is_active: bool,
    /// True once the overlay has been shown at least once.
    pub booted: bool,
    /// Whether the activator is fixed-positioned.
    pub activator_fixed: bool,
    /// Whether a windowing environment was available at the last query.
    pub has_window: bool,
    pub internal_z_index: i32,
    pub dimensions: Dimensions,
    pub page: PageMetrics,
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`OverlayController`].
pub struct OverlayBuilder {
    content: ElementRef,
    activator: Option<ElementRef>,
    dom: Arc<dyn DomAdapter>,
    dispatcher: Arc<UiDispatcher>,
    host: Arc<dyn OverlayHost>,
    config: PositionerConfig,
    options: OverlayOptions,
}

impl OverlayBuilder {
    /// Start building an overlay for the content element `content`.
    pub fn new(
        content: impl Into<ElementRef>,
        dom: Arc<dyn DomAdapter>,
        dispatcher: Arc<UiDispatcher>,
    ) -> Self {
        Self {
            content: content.into(),
            activator: None,
            dom,
            dispatcher,
            host: Arc::new(NoopHost),
            config: PositionerConfig::default(),
            options: OverlayOptions::default(),
        }
    }

    /// Position against this activator element.
    ///
    /// Without an activator the overlay always positions in absolute mode.
    pub fn activator(mut self, activator: impl Into<ElementRef>) -> Self {
        self.activator = Some(activator.into());
        self
    }

    /// Set the rendering host.
    pub fn host(mut self, host: Arc<dyn OverlayHost>) -> Self {
        self.host = host;
        self
    }

    /// Set the positioner configuration.
    pub fn config(mut self, config: PositionerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set controller options.
    pub fn options(mut self, options: OverlayOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the controller.
    pub fn build(self) -> Result<OverlayController> {
        let owner = OwnerType::of::<OverlayController>().with_properties(props::ALL);
        let inner = Arc::new(ControllerInner {
            store: ReactiveStore::new(owner),
            dom: self.dom,
            host: self.host,
            dispatcher: self.dispatcher,
            content: self.content,
            activator: self.activator,
            options: self.options,
            config: RwLock::new(self.config),
            state: Mutex::new(ControllerState::default()),
        });

        inner.store.set_value(props::IS_ACTIVE, false)?;
        inner
            .store
            .set_value(props::SHOW_CONTENT, !inner.options.lazy_content)?;

        let weak = Arc::downgrade(&inner);
        inner.store.watch_value(props::IS_ACTIVE, move |active: &bool| {
            if let Some(inner) = weak.upgrade() {
                inner.on_is_active_changed(*active);
            }
        })?;

        Ok(OverlayController { inner })
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Drives one overlay through its lifecycle.
///
/// Dropping the controller disposes it.
pub struct OverlayController {
    inner: Arc<ControllerInner>,
}

impl OverlayController {
    /// Start building an overlay for the content element `content`.
    pub fn builder(
        content: impl Into<ElementRef>,
        dom: Arc<dyn DomAdapter>,
        dispatcher: Arc<UiDispatcher>,
    ) -> OverlayBuilder {
        OverlayBuilder::new(content, dom, dispatcher)
    }

    /// Query the windowing environment. Called on first render.
    ///
    /// Idempotent; activation mounts implicitly.
    pub fn mount(&self) {
        self.inner.ensure_mounted();
    }

    /// Show or hide the overlay.
    pub fn set_active(&self, active: bool) -> Result<()> {
        if active {
            self.inner.activate()
        } else {
            self.inner.deactivate()
        }
    }

    /// Whether the overlay is currently shown.
    pub fn is_active(&self) -> bool {
        self.inner.peek(props::IS_ACTIVE).unwrap_or(false)
    }

    /// Whether the overlay has ever been activated.
    pub fn is_booted(&self) -> bool {
        self.inner.state.lock().booted
    }

    pub fn phase(&self) -> OverlayPhase {
        self.inner.state.lock().phase
    }

    /// Whether the content node should be present in the render tree.
    pub fn show_content(&self) -> bool {
        self.inner.peek(props::SHOW_CONTENT).unwrap_or(false)
    }

    pub fn internal_z_index(&self) -> i32 {
        self.inner.peek(props::INTERNAL_Z_INDEX).unwrap_or(0)
    }

    /// The last activator/content measurement.
    pub fn dimensions(&self) -> Dimensions {
        self.inner.peek(props::DIMENSIONS).unwrap_or_default()
    }

    /// The computed content left.
    ///
    /// Zero without a windowing environment.
    pub fn left(&self) -> Result<f64> {
        self.inner.computed_position(props::COMPUTED_LEFT, Axis::Left)
    }

    /// The computed content top.
    ///
    /// Zero without a windowing environment.
    pub fn top(&self) -> Result<f64> {
        self.inner.computed_position(props::COMPUTED_TOP, Axis::Top)
    }

    /// A snapshot of the overlay's state.
    pub fn state(&self) -> OverlayState {
        let (phase, booted, activator_fixed, has_window) = {
            let state = self.inner.state.lock();
            (
                state.phase,
                state.booted,
                state.activator_fixed,
                state.has_window,
            )
        };
        OverlayState {
            phase,
            is_active: self.is_active(),
            booted,
            activator_fixed,
            has_window,
            internal_z_index: self.internal_z_index(),
            dimensions: self.dimensions(),
            page: self.inner.peek(props::PAGE_METRICS).unwrap_or_default(),
        }
    }

    /// The current positioner configuration.
    pub fn config(&self) -> PositionerConfig {
        self.inner.config.read().clone()
    }

    /// Replace the positioner configuration.
    ///
    /// Computed positions are re-derived, and an active overlay is
    /// re-measured.
    pub fn set_config(&self, config: PositionerConfig) -> Result<()> {
        *self.inner.config.write() = config;
        let revision = self.inner.store.get_value(props::CONFIG_REVISION, 0_u64)?;
        self.inner
            .store
            .set_value(props::CONFIG_REVISION, revision.wrapping_add(1))?;
        if self.is_active() {
            self.inner.update_dimensions();
        }
        Ok(())
    }

    /// Handle a window resize.
    pub fn on_resize(&self) {
        self.inner.on_resize();
    }

    /// Re-measure on the next UI cycle.
    pub fn update_dimensions(&self) {
        self.inner.update_dimensions();
    }

    /// Handle a click on the activator at client coordinates `(x, y)`.
    ///
    /// The click position becomes the absolute-mode origin. With
    /// `open_on_click` the overlay is toggled. A re-measure follows either way.
    pub fn on_activator_click(&self, x: f64, y: f64) -> Result<()> {
        self.inner.on_activator_click(x, y)
    }

    /// The controller's reactive store.
    pub fn store(&self) -> &ReactiveStore {
        &self.inner.store
    }

    pub fn content(&self) -> &ElementRef {
        &self.inner.content
    }

    /// Release listeners, remove the content and dispose the store.
    ///
    /// Idempotent. Removal failures are ignored.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state.lock().disposed
    }
}

impl Drop for OverlayController {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

impl std::fmt::Debug for OverlayController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayController")
            .field("content", &self.inner.content)
            .field("activator", &self.inner.activator)
            .field("phase", &self.phase())
            .finish()
    }
}

static_assertions::assert_impl_all!(OverlayController: Send, Sync);

// ============================================================================
// Internals
// ============================================================================

#[derive(Debug, Default)]
struct ControllerState {
    phase: OverlayPhase,
    booted: bool,
    /// Set once the first-activation hooks have run. Stays false if the boot
    /// continuation was discarded, so the next activation boots again.
    lazy_mounted: bool,
    mounted: bool,
    disposed: bool,
    has_window: bool,
    activator_fixed: bool,
    /// Bumped on every activation, deactivation and disposal. A measurement
    /// is applied only if the generation it was requested under is current.
    generation: u64,
    absolute_x: f64,
    absolute_y: f64,
    resize_listener: Option<ListenerId>,
    outside_click: bool,
}

enum Activation {
    Boot(u64),
    Reopen(u64),
    Ignore,
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    Left,
    Top,
}

struct Measurement {
    viewport: Option<ViewportMetrics>,
    activator_fixed: bool,
    page: PageMetrics,
    dimensions: Dimensions,
    z_index: i32,
}

struct ControllerInner {
    store: ReactiveStore,
    dom: Arc<dyn DomAdapter>,
    host: Arc<dyn OverlayHost>,
    dispatcher: Arc<UiDispatcher>,
    content: ElementRef,
    activator: Option<ElementRef>,
    options: OverlayOptions,
    config: RwLock<PositionerConfig>,
    // Never held across calls into the store, the adapter or the host.
    state: Mutex<ControllerState>,
}

impl ControllerInner {
    fn peek<T: horizon_veil_core::PropertyValue>(&self, name: &str) -> Option<T> {
        self.store.peek(name).ok().flatten()
    }

    fn is_current(&self, generation: u64) -> bool {
        let state = self.state.lock();
        !state.disposed && state.generation == generation
    }

    fn selectors(&self) -> Vec<ElementRef> {
        let mut selectors = vec![self.content.clone()];
        selectors.extend(self.activator.iter().cloned());
        selectors
    }

    fn ensure_mounted(&self) {
        {
            let mut state = self.state.lock();
            if state.mounted || state.disposed {
                return;
            }
            state.mounted = true;
        }

        let has_window = self.dom.query_window_and_document().is_some();
        self.state.lock().has_window = has_window;
        if !has_window {
            tracing::debug!(
                target: targets::OVERLAY,
                content = %self.content,
                "no windowing environment; overlay geometry disabled"
            );
        }
    }

    fn activate(self: &Arc<Self>) -> Result<()> {
        self.ensure_mounted();

        let activation = {
            let mut state = self.state.lock();
            if state.disposed || state.phase != OverlayPhase::Closed {
                Activation::Ignore
            } else {
                state.generation += 1;
                state.phase = OverlayPhase::Opening;
                if state.lazy_mounted {
                    Activation::Reopen(state.generation)
                } else {
                    state.booted = true;
                    Activation::Boot(state.generation)
                }
            }
        };

        match activation {
            Activation::Ignore => Ok(()),
            Activation::Boot(generation) => {
                tracing::debug!(target: targets::OVERLAY, content = %self.content, "booting overlay");
                self.acquire_resize_listener();
                self.store.set_value(props::SHOW_CONTENT, true)?;
                self.host.request_render();

                let weak = Arc::downgrade(self);
                self.dispatcher.post(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.show_lazy_content(generation);
                    }
                });
                Ok(())
            }
            Activation::Reopen(generation) => {
                self.acquire_resize_listener();
                self.store.set_value(props::IS_ACTIVE, true)?;
                self.schedule_measurement(generation, false);
                self.host.request_render();
                Ok(())
            }
        }
    }

    fn deactivate(&self) -> Result<()> {
        let booted = {
            let mut state = self.state.lock();
            if state.disposed {
                return Ok(());
            }
            state.generation += 1;
            state.phase = OverlayPhase::Closed;
            state.booted
        };

        self.store.set_value(props::IS_ACTIVE, false)?;
        self.release_listeners();
        if booted {
            self.dom.apply_z_index(&self.content, None);
            self.remove_content();
        }
        self.host.request_render();
        Ok(())
    }

    /// First-activation continuation: mount hooks, then measure.
    fn show_lazy_content(self: &Arc<Self>, generation: u64) {
        if !self.is_current(generation) {
            tracing::debug!(target: targets::OVERLAY, generation, "discarding stale boot");
            return;
        }

        self.mount_lazy_content();
        self.measure(generation, true);
    }

    fn mount_lazy_content(&self) {
        {
            let mut state = self.state.lock();
            if state.lazy_mounted {
                return;
            }
            state.lazy_mounted = true;
        }

        self.host.after_show_content();
        let attach = self.config.read().attach.clone();
        self.host.move_content_to(attach.as_deref());
    }

    fn update_dimensions(self: &Arc<Self>) {
        let generation = {
            let state = self.state.lock();
            if state.disposed {
                return;
            }
            state.generation
        };
        self.schedule_measurement(generation, false);
    }

    fn schedule_measurement(self: &Arc<Self>, generation: u64, activate: bool) {
        let weak = Arc::downgrade(self);
        self.dispatcher.post(move || {
            if let Some(inner) = weak.upgrade() {
                inner.measure(generation, activate);
            }
        });
    }

    /// Measure now and apply the result on the next cycle.
    fn measure(self: &Arc<Self>, generation: u64, activate: bool) {
        if !self.is_current(generation) {
            tracing::debug!(target: targets::OVERLAY, generation, "discarding stale measurement request");
            return;
        }

        let measurement = {
            let _span = PerfSpan::new("overlay_measure");
            self.take_measurement()
        };
        {
            let mut state = self.state.lock();
            state.has_window = measurement.viewport.is_some();
            state.activator_fixed = measurement.activator_fixed;
        }

        let weak = Arc::downgrade(self);
        self.dispatcher.post(move || {
            if let Some(inner) = weak.upgrade() {
                inner.apply(generation, activate, measurement);
            }
        });
    }

    fn take_measurement(&self) -> Measurement {
        let config = self.config.read().clone();
        let viewport = self.dom.query_window_and_document();
        let has_window = viewport.is_some();

        let activator_fixed = match (&self.activator, has_window) {
            (Some(activator), true) => self.dom.is_element_fixed_positioned(activator.selector()),
            _ => false,
        };
        let page = viewport
            .map(|viewport| PageMetrics::from_viewport(&viewport, activator_fixed))
            .unwrap_or_default();

        let activator = match &self.activator {
            Some(activator) if !config.absolute => {
                let snapshot = self.measure_element(activator, &config, has_window);
                if config.is_attached() {
                    snapshot
                } else {
                    snapshot.with_offsets(snapshot.offset_left, 0.0)
                }
            }
            _ => {
                let (x, y) = {
                    let state = self.state.lock();
                    (state.absolute_x, state.absolute_y)
                };
                GeometrySnapshot::absolute(
                    config.position_x.unwrap_or(x),
                    config.position_y.unwrap_or(y),
                )
            }
        };
        let content = self.measure_element(&self.content, &config, has_window);

        let current_max = self
            .dom
            .max_z_index_among_open_overlays(std::slice::from_ref(&self.content));
        let z_index = StackingArbiter::new(self.options.stack_floor)
            .next_z_index(config.z_index.as_ref(), current_max);

        Measurement {
            viewport,
            activator_fixed,
            page,
            dimensions: Dimensions::new(activator, content),
            z_index,
        }
    }

    fn measure_element(
        &self,
        element: &ElementRef,
        config: &PositionerConfig,
        has_window: bool,
    ) -> GeometrySnapshot {
        if !has_window {
            return GeometrySnapshot::default();
        }
        let Some(snapshot) = self.dom.measure_element(element) else {
            return GeometrySnapshot::default();
        };
        if !config.is_attached() {
            return snapshot;
        }

        let styles = self.dom.measure_styles(element, &[MARGIN_LEFT, MARGIN_RIGHT]);
        let margin = |property: &str| styles.get(property).and_then(|value| parse_css_pixels(value));
        snapshot.with_horizontal_edges(margin(MARGIN_LEFT), margin(MARGIN_RIGHT))
    }

    fn apply(self: &Arc<Self>, generation: u64, activate: bool, measurement: Measurement) {
        let _span = tracing::debug_span!(target: targets::OVERLAY, span_names::OVERLAY, generation).entered();
        let (opened, is_open) = {
            let mut state = self.state.lock();
            if state.disposed || state.generation != generation {
                tracing::debug!(target: targets::OVERLAY, generation, "discarding stale measurement");
                return;
            }
            let opened = state.phase == OverlayPhase::Opening;
            if opened {
                state.phase = OverlayPhase::Open;
            }
            (opened, state.phase == OverlayPhase::Open)
        };

        if let Err(err) = self.write_measurement(&measurement, activate) {
            tracing::error!(target: targets::OVERLAY, error = %err, "failed to apply overlay measurement");
        }
        if is_open {
            self.dom.apply_z_index(&self.content, Some(measurement.z_index));
        }
        if opened {
            self.acquire_outside_click_listener();
            tracing::debug!(
                target: targets::OVERLAY,
                content = %self.content,
                z_index = measurement.z_index,
                "overlay opened"
            );
        }
        self.host.request_render();
    }

    fn write_measurement(&self, measurement: &Measurement, activate: bool) -> Result<()> {
        self.store.set_value(props::PAGE_METRICS, measurement.page)?;
        self.store.set_value(props::DIMENSIONS, measurement.dimensions)?;
        self.store.set_value(props::INTERNAL_Z_INDEX, measurement.z_index)?;
        if activate {
            self.store.set_value(props::IS_ACTIVE, true)?;
        }
        Ok(())
    }

    fn computed_position(self: &Arc<Self>, name: &str, axis: Axis) -> Result<f64> {
        let dependencies = Dependencies::explicit([
            props::DIMENSIONS,
            props::PAGE_METRICS,
            props::CONFIG_REVISION,
        ]);
        let factory = position_factory(Arc::downgrade(self), axis);
        Ok(self.store.get_computed_value(name, dependencies, factory)?)
    }

    fn on_is_active_changed(self: &Arc<Self>, active: bool) {
        let booted = self.state.lock().booted;
        if booted && active && self.config.read().absolute {
            self.update_dimensions();
        }
    }

    fn on_resize(self: &Arc<Self>) {
        if self.peek::<bool>(props::IS_ACTIVE).unwrap_or(false) {
            self.update_dimensions();
        }
    }

    fn on_activator_click(self: &Arc<Self>, x: f64, y: f64) -> Result<()> {
        let shown = {
            let mut state = self.state.lock();
            if state.disposed {
                return Ok(());
            }
            state.absolute_x = x;
            state.absolute_y = y;
            state.phase != OverlayPhase::Closed
        };

        if self.options.open_on_click {
            if shown {
                self.deactivate()?;
            } else {
                self.activate()?;
            }
        }
        self.update_dimensions();
        Ok(())
    }

    fn acquire_resize_listener(self: &Arc<Self>) {
        {
            let state = self.state.lock();
            if !state.has_window || state.resize_listener.is_some() || state.disposed {
                return;
            }
        }

        let weak = Arc::downgrade(self);
        let id = self.dom.add_resize_listener(Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_resize();
            }
        }));
        let previous = self.state.lock().resize_listener.replace(id);
        if let Some(previous) = previous {
            self.dom.remove_resize_listener(previous);
        }
    }

    fn acquire_outside_click_listener(self: &Arc<Self>) {
        if !self.options.close_on_outside_click {
            return;
        }
        {
            let mut state = self.state.lock();
            if state.outside_click || state.disposed {
                return;
            }
            state.outside_click = true;
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        self.dom.add_outside_click_listener(
            &self.selectors(),
            Arc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    if let Err(err) = inner.deactivate() {
                        tracing::error!(target: targets::OVERLAY, error = %err, "outside click failed to close overlay");
                    }
                }
            }),
        );
    }

    fn release_listeners(&self) {
        let (resize, outside_click) = {
            let mut state = self.state.lock();
            (
                state.resize_listener.take(),
                std::mem::take(&mut state.outside_click),
            )
        };
        if let Some(id) = resize {
            self.dom.remove_resize_listener(id);
        }
        if outside_click {
            self.dom.remove_outside_click_listener(&self.selectors());
        }
    }

    fn remove_content(&self) {
        let attach = self.config.read().attach.clone();
        if let Err(err) = self
            .dom
            .detach_and_remove_element(&self.content, attach.as_deref())
        {
            tracing::debug!(
                target: targets::OVERLAY,
                content = %self.content,
                error = %err,
                "content removal failed; ignoring"
            );
        }
    }

    fn dispose(&self) {
        let resize = {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.generation += 1;
            state.phase = OverlayPhase::Closed;
            state.outside_click = false;
            state.resize_listener.take()
        };

        if let Some(id) = resize {
            self.dom.remove_resize_listener(id);
        }
        self.dom.remove_outside_click_listener(&self.selectors());
        self.dom.apply_z_index(&self.content, None);
        self.remove_content();
        self.store.dispose();
        tracing::debug!(target: targets::OVERLAY, content = %self.content, "overlay disposed");
    }
}

fn position_factory(
    inner: Weak<ControllerInner>,
    axis: Axis,
) -> impl Fn(&ReactiveStore) -> horizon_veil_core::Result<f64> + Send + Sync + 'static {
    move |store: &ReactiveStore| {
        let dims = store.get_value(props::DIMENSIONS, Dimensions::default())?;
        let page = store.get_value(props::PAGE_METRICS, PageMetrics::default())?;
        let Some(inner) = inner.upgrade() else {
            return Ok(0.0);
        };
        if !inner.state.lock().has_window {
            return Ok(0.0);
        }

        let config = inner.config.read().clone();
        let positioner = OverlayPositioner::new(&config).with_edge_margin(inner.options.edge_margin);
        Ok(match axis {
            Axis::Left => positioner.compute_left(&dims, &page),
            Axis::Top => positioner.compute_top(&dims, &page),
        })
    }
}
