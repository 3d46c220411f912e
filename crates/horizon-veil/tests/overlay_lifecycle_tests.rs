//! Integration tests for the overlay lifecycle against a headless document.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use horizon_veil::reactive::UiDispatcher;
use horizon_veil::{
    BoundingRect, ElementRef, GeometrySnapshot, HeadlessDom, OverlayController, OverlayHost,
    OverlayOptions, OverlayPhase, PositionerConfig, ViewportMetrics,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("horizon_veil=debug,horizon_veil_core=debug")
        .with_test_writer()
        .try_init();
}

fn viewport() -> ViewportMetrics {
    ViewportMetrics {
        inner_height: 800.0,
        inner_width: 1000.0,
        client_height: 800.0,
        client_width: 1000.0,
        ..Default::default()
    }
}

fn rect(left: f64, top: f64, width: f64, height: f64) -> GeometrySnapshot {
    GeometrySnapshot::from_rect(BoundingRect::new(left, top, width, height))
}

struct Page {
    dom: Arc<HeadlessDom>,
    dispatcher: Arc<UiDispatcher>,
}

impl Page {
    fn new() -> Self {
        init_tracing();
        let dom = Arc::new(HeadlessDom::with_viewport(viewport()));
        dom.set_element("#activator", rect(100.0, 200.0, 50.0, 20.0));
        dom.set_element("#menu", rect(0.0, 0.0, 80.0, 40.0));
        Self {
            dom,
            dispatcher: Arc::new(UiDispatcher::new()),
        }
    }

    fn menu(&self) -> OverlayController {
        self.overlay("#menu", PositionerConfig::default(), OverlayOptions::default())
    }

    fn overlay(
        &self,
        content: &str,
        config: PositionerConfig,
        options: OverlayOptions,
    ) -> OverlayController {
        OverlayController::builder(content, self.dom.clone(), self.dispatcher.clone())
            .activator("#activator")
            .config(config)
            .options(options)
            .build()
            .unwrap()
    }

    fn settle(&self) {
        self.dispatcher.run_until_idle(32);
    }
}

#[derive(Default)]
struct CountingHost {
    mounted: AtomicUsize,
    renders: AtomicUsize,
}

impl OverlayHost for CountingHost {
    fn request_render(&self) {
        self.renders.fetch_add(1, Ordering::SeqCst);
    }

    fn after_show_content(&self) {
        self.mounted.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_boot_happens_once_across_open_close_cycles() {
    let page = Page::new();
    let host = Arc::new(CountingHost::default());
    let menu = OverlayController::builder("#menu", page.dom.clone(), page.dispatcher.clone())
        .activator("#activator")
        .host(host.clone())
        .build()
        .unwrap();
    assert!(!menu.show_content());

    for _ in 0..3 {
        menu.set_active(true).unwrap();
        page.settle();
        assert!(menu.is_active());
        assert!(menu.is_booted());
        menu.set_active(false).unwrap();
        assert!(!menu.is_active());
    }

    assert_eq!(host.mounted.load(Ordering::SeqCst), 1);
    assert!(host.renders.load(Ordering::SeqCst) >= 6);
    assert!(menu.show_content());
}

#[test]
fn test_repeated_activation_is_ignored_while_opening() {
    let page = Page::new();
    let menu = page.menu();

    menu.set_active(true).unwrap();
    menu.set_active(true).unwrap();
    assert_eq!(page.dispatcher.pending_count(), 1);

    page.settle();
    assert_eq!(menu.phase(), OverlayPhase::Open);
}

#[test]
fn test_deactivate_during_pending_boot_measurement() {
    let page = Page::new();
    let menu = page.menu();

    menu.set_active(true).unwrap();
    page.dispatcher.run_cycle(); // measured; application still pending
    menu.set_active(false).unwrap();
    page.settle();

    assert!(!menu.is_active());
    assert_eq!(menu.phase(), OverlayPhase::Closed);
    assert_eq!(page.dom.z_index_of(menu.content()), None);
    assert_eq!(page.dom.outside_click_listener_count(), 0);
}

#[test]
fn test_deactivate_before_boot_runs() {
    let page = Page::new();
    let menu = page.menu();

    menu.set_active(true).unwrap();
    menu.set_active(false).unwrap();
    page.settle();

    assert!(!menu.is_active());
    assert_eq!(page.dom.measurement_count(), 0);
}

#[test]
fn test_interrupted_boot_mounts_on_next_activation() {
    let page = Page::new();
    let host = Arc::new(CountingHost::default());
    let menu = OverlayController::builder("#menu", page.dom.clone(), page.dispatcher.clone())
        .activator("#activator")
        .host(host.clone())
        .build()
        .unwrap();

    menu.set_active(true).unwrap();
    menu.set_active(false).unwrap();
    menu.set_active(true).unwrap();
    page.settle();

    assert!(menu.is_active());
    assert_eq!(menu.phase(), OverlayPhase::Open);
    assert_eq!(host.mounted.load(Ordering::SeqCst), 1);
    assert_eq!(menu.left().unwrap(), 100.0);

    menu.set_active(false).unwrap();
    menu.set_active(true).unwrap();
    page.settle();

    assert!(menu.is_active());
    assert_eq!(host.mounted.load(Ordering::SeqCst), 1);
}

#[test]
fn test_deactivate_during_pending_reopen_measurement() {
    let page = Page::new();
    let menu = page.menu();

    menu.set_active(true).unwrap();
    page.settle();
    menu.set_active(false).unwrap();

    menu.set_active(true).unwrap();
    assert!(menu.is_active());
    menu.set_active(false).unwrap();
    page.settle();

    assert!(!menu.is_active());
    assert_eq!(menu.phase(), OverlayPhase::Closed);
}

#[test]
fn test_resize_remeasures_open_overlay() {
    let page = Page::new();
    let menu = page.menu();

    menu.set_active(true).unwrap();
    page.settle();
    assert_eq!(menu.left().unwrap(), 100.0);
    assert_eq!(page.dom.resize_listener_count(), 1);

    page.dom.set_element("#activator", rect(300.0, 200.0, 50.0, 20.0));
    page.dom.trigger_resize();
    page.settle();

    assert_eq!(menu.dimensions().activator.left(), 300.0);
    assert_eq!(menu.left().unwrap(), 300.0);
}

#[test]
fn test_resize_ignored_while_closed() {
    let page = Page::new();
    let menu = page.menu();

    menu.set_active(true).unwrap();
    page.settle();
    menu.set_active(false).unwrap();
    assert_eq!(page.dom.resize_listener_count(), 0);

    let measured = page.dom.measurement_count();
    menu.on_resize();
    page.settle();
    assert_eq!(page.dom.measurement_count(), measured);
}

#[test]
fn test_second_overlay_stacks_above_first() {
    let page = Page::new();
    page.dom.set_element("#submenu", rect(0.0, 0.0, 60.0, 30.0));
    let menu = page.menu();
    let submenu = page.overlay(
        "#submenu",
        PositionerConfig::default(),
        OverlayOptions::default(),
    );

    menu.set_active(true).unwrap();
    page.settle();
    submenu.set_active(true).unwrap();
    page.settle();

    assert_eq!(menu.internal_z_index(), 8);
    assert_eq!(submenu.internal_z_index(), 10);
    assert!(submenu.internal_z_index() > menu.internal_z_index());
    assert_eq!(
        page.dom.z_index_of(&ElementRef::new("#submenu")),
        Some(10)
    );
}

#[test]
fn test_explicit_z_index_and_stack_floor() {
    let page = Page::new();
    page.dom.set_element("#dialog", rect(0.0, 0.0, 200.0, 100.0));
    let menu = page.overlay(
        "#menu",
        PositionerConfig::new().z_index(50),
        OverlayOptions::default(),
    );
    let dialog = page.overlay(
        "#dialog",
        PositionerConfig::default(),
        OverlayOptions::new().stack_floor(200),
    );

    menu.set_active(true).unwrap();
    dialog.set_active(true).unwrap();
    page.settle();

    assert_eq!(menu.internal_z_index(), 50);
    assert_eq!(dialog.internal_z_index(), 202);
}

#[test]
fn test_dispose_never_opened_overlay() {
    let page = Page::new();
    let ghost = OverlayController::builder("#ghost", page.dom.clone(), page.dispatcher.clone())
        .build()
        .unwrap();

    ghost.dispose();
    ghost.dispose();

    assert!(ghost.is_disposed());
    assert!(ghost.store().is_disposed());
    assert!(ghost.left().is_err());
    assert!(ghost.set_active(true).is_ok());
    assert!(!page.dispatcher.has_pending());
}

#[test]
fn test_drop_releases_listeners() {
    let page = Page::new();
    let menu = page.menu();

    menu.set_active(true).unwrap();
    page.settle();
    assert_eq!(page.dom.resize_listener_count(), 1);
    assert_eq!(page.dom.outside_click_listener_count(), 1);

    let content = menu.content().clone();
    drop(menu);

    assert_eq!(page.dom.resize_listener_count(), 0);
    assert_eq!(page.dom.outside_click_listener_count(), 0);
    assert_eq!(page.dom.z_index_of(&content), None);
    assert_eq!(page.dom.detach_count(&content), 1);
}

#[test]
fn test_pending_tasks_after_drop_are_harmless() {
    let page = Page::new();
    let menu = page.menu();

    menu.set_active(true).unwrap();
    drop(menu);
    page.settle();

    assert!(!page.dispatcher.has_pending());
}

#[test]
fn test_opens_without_window() {
    init_tracing();
    let dom = Arc::new(HeadlessDom::new());
    dom.set_element("#activator", rect(100.0, 200.0, 50.0, 20.0));
    dom.set_element("#menu", rect(0.0, 0.0, 80.0, 40.0));
    let dispatcher = Arc::new(UiDispatcher::new());

    let menu = OverlayController::builder("#menu", dom.clone(), dispatcher.clone())
        .activator("#activator")
        .build()
        .unwrap();
    menu.mount();
    menu.set_active(true).unwrap();
    dispatcher.run_until_idle(32);

    let state = menu.state();
    assert!(state.is_active);
    assert!(!state.has_window);
    assert_eq!(state.dimensions.activator.width(), 0.0);
    assert_eq!(menu.left().unwrap(), 0.0);
    assert_eq!(menu.top().unwrap(), 0.0);
    assert_eq!(dom.resize_listener_count(), 0);
}

#[test]
fn test_outside_click_closes_overlay() {
    let page = Page::new();
    let menu = page.menu();

    menu.set_active(true).unwrap();
    page.settle();
    page.dom.trigger_outside_click();

    assert!(!menu.is_active());
    assert_eq!(menu.phase(), OverlayPhase::Closed);
    assert_eq!(page.dom.outside_click_listener_count(), 0);
}

#[test]
fn test_outside_click_listener_optional() {
    let page = Page::new();
    let menu = page.overlay(
        "#menu",
        PositionerConfig::default(),
        OverlayOptions::new().close_on_outside_click(false),
    );

    menu.set_active(true).unwrap();
    page.settle();
    page.dom.trigger_outside_click();

    assert!(menu.is_active());
    assert_eq!(page.dom.outside_click_listener_count(), 0);
}

#[test]
fn test_activator_click_toggles() {
    let page = Page::new();
    let menu = page.menu();

    menu.on_activator_click(120.0, 210.0).unwrap();
    page.settle();
    assert!(menu.is_active());

    menu.on_activator_click(120.0, 210.0).unwrap();
    page.settle();
    assert!(!menu.is_active());
}

#[test]
fn test_activator_click_without_open_on_click() {
    let page = Page::new();
    let menu = page.overlay(
        "#menu",
        PositionerConfig::default(),
        OverlayOptions::new().open_on_click(false),
    );

    menu.on_activator_click(120.0, 210.0).unwrap();
    page.settle();
    assert!(!menu.is_active());
    assert!(!menu.is_booted());
}

#[test]
fn test_explicit_position_without_activator() {
    let page = Page::new();
    let menu = OverlayController::builder("#menu", page.dom.clone(), page.dispatcher.clone())
        .config(PositionerConfig::new().position(40.0, 60.0))
        .build()
        .unwrap();

    menu.set_active(true).unwrap();
    page.settle();

    let activator = menu.dimensions().activator;
    assert_eq!((activator.left(), activator.top()), (40.0, 60.0));
    assert_eq!(menu.left().unwrap(), 40.0);
    assert_eq!(menu.top().unwrap(), 60.0);
}

#[test]
fn test_overflowing_menu_is_pulled_back_on_screen() {
    let page = Page::new();
    page.dom.set_element("#activator", rect(950.0, 780.0, 40.0, 20.0));
    let menu = page.menu();

    menu.set_active(true).unwrap();
    page.settle();

    // 950 + 80 - 1000 + 12 = 42 past the right edge.
    assert_eq!(menu.left().unwrap(), 908.0);
    // 800 - 40 - 12
    assert_eq!(menu.top().unwrap(), 748.0);
}

#[test]
fn test_config_change_updates_position() {
    let page = Page::new();
    let menu = page.menu();

    menu.set_active(true).unwrap();
    page.settle();
    assert_eq!(menu.top().unwrap(), 200.0);

    menu.set_config(PositionerConfig::new().offset_y(true).nudge_bottom(5))
        .unwrap();
    assert_eq!(menu.top().unwrap(), 225.0);
    page.settle();
    assert_eq!(menu.top().unwrap(), 225.0);
}

#[test]
fn test_config_from_json() {
    use horizon_veil::Length;

    let config: PositionerConfig = serde_json::from_str(
        r##"{"offsetY": true, "zIndex": 50, "maxWidth": "auto", "nudgeLeft": "4px", "attach": "#app"}"##,
    )
    .unwrap();

    assert!(config.offset_y);
    assert_eq!(config.z_index, Some(Length::Px(50.0)));
    assert_eq!(config.max_width, Some(Length::Keyword("auto".into())));
    assert_eq!(config.nudge_left, Some(Length::Px(4.0)));
    assert!(config.is_attached());

    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["zIndex"], serde_json::json!(50.0));
    assert_eq!(json["maxWidth"], serde_json::json!("auto"));
}
