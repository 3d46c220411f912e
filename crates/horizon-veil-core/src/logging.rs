//! Logging and debugging facilities for Horizon Veil.
//!
//! This module provides:
//! - Target and span names for filtering `tracing` output by subsystem
//! - [`StoreDebug`], a readable dump of a reactive store's cells
//! - [`PerfSpan`] for timing an operation
//!
//! # Tracing Integration
//!
//! Horizon Veil uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("horizon_veil=debug,horizon_veil_core::store=trace")
//!         .init();
//! }
//! ```

use std::fmt::{self, Write as FmtWrite};

use crate::store::ReactiveStore;

/// Span names used throughout Horizon Veil for tracing.
pub mod span_names {
    /// Overlay open/measure/apply span.
    pub const OVERLAY: &str = "horizon_veil::overlay";
    /// UI cycle processing span.
    pub const DISPATCH: &str = "horizon_veil::dispatch";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Reactive store target.
    pub const STORE: &str = "horizon_veil_core::store";
    /// Signal system target.
    pub const SIGNAL: &str = "horizon_veil_core::signal";
    /// UI dispatcher target.
    pub const DISPATCHER: &str = "horizon_veil_core::dispatcher";
    /// Overlay lifecycle target.
    pub const OVERLAY: &str = "horizon_veil::overlay";
    /// Position computation target.
    pub const POSITIONER: &str = "horizon_veil::positioner";
    /// [`PerfSpan`](super::PerfSpan) target.
    pub const PERF: &str = "horizon_veil::perf";
}

/// Debug utility listing the cells of a [`ReactiveStore`].
///
/// Cells are printed sorted by name, with their value type (or `untyped`) and
/// a `*` marker for cells that have a value.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreDebug {
    show_types: bool,
}

impl StoreDebug {
    /// Create a formatter that also prints value types.
    pub fn new() -> Self {
        Self { show_types: true }
    }

    /// Create a formatter that prints names only.
    pub fn minimal() -> Self {
        Self { show_types: false }
    }

    /// Format every cell of `store`.
    pub fn format(&self, store: &ReactiveStore) -> String {
        let mut names = store.names();
        names.sort();

        let mut output = String::new();
        let _ = writeln!(
            output,
            "{} ({} cells):",
            short_type_name(store.owner().type_name()),
            names.len()
        );
        for name in names {
            let marker = if store.has_value(&name) { "*" } else { " " };
            let _ = write!(output, "  {marker} {name}");
            if self.show_types {
                match store.type_of(&name) {
                    Some(descriptor) => {
                        let _ = write!(output, ": {}", short_type_name(descriptor.type_name));
                    }
                    None => output.push_str(": untyped"),
                }
            }
            output.push('\n');
        }
        output
    }
}

fn short_type_name(type_name: &str) -> &str {
    // Keep generics intact: only strip the path before the first `<`.
    let head = type_name.split('<').next().unwrap_or(type_name);
    match head.rfind("::") {
        Some(pos) => &type_name[pos + 2..],
        None => type_name,
    }
}

/// Formats a store with the default [`StoreDebug`] options.
pub struct DisplayStore<'a>(pub &'a ReactiveStore);

impl fmt::Display for DisplayStore<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&StoreDebug::new().format(self.0))
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Useful for tracking the duration of an operation.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
