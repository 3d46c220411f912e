//! Core systems for Horizon Veil.
//!
//! This crate provides the reactive foundation the overlay engine builds on:
//!
//! - **Signals**: ordered, re-entrant multicast notification
//! - **Reactive cells**: typed values with change notification, plus untyped
//!   placeholders for names watched before their type is known
//! - **Reactive store**: a per-component bag of named cells with computed
//!   values, watches and deferred writes
//! - **Dependency resolution**: explicit or read-tracked dependencies for
//!   computed cells
//! - **UI dispatcher**: a next-cycle task queue for cooperative scheduling
//!
//! # Store Example
//!
//! ```
//! use horizon_veil_core::{OwnerType, ReactiveStore};
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//!
//! struct Menu;
//!
//! let store = ReactiveStore::new(OwnerType::of::<Menu>());
//! let log = Arc::new(Mutex::new(Vec::new()));
//!
//! let log_clone = log.clone();
//! store.watch("IsActive", move |new: &bool, old: &bool| {
//!     log_clone.lock().push((*new, *old));
//! })?;
//!
//! store.set_value("IsActive", true)?;
//! store.set_value("IsActive", true)?; // unchanged, no notification
//! store.set_value("IsActive", false)?;
//!
//! assert_eq!(*log.lock(), vec![(true, false), (false, true)]);
//! # Ok::<(), horizon_veil_core::Error>(())
//! ```
//!
//! # Dispatcher Example
//!
//! ```
//! use horizon_veil_core::UiDispatcher;
//!
//! let dispatcher = UiDispatcher::new();
//! dispatcher.post(|| println!("runs on the next cycle"));
//! assert_eq!(dispatcher.run_cycle(), 1);
//! ```

pub mod dependency;
pub mod dispatcher;
mod error;
pub mod logging;
pub mod property;
pub mod signal;
pub mod store;

pub use dependency::{Dependencies, DependencyResolver, OwnerType};
pub use dispatcher::{TaskId, UiDispatcher};
pub use error::{Error, Result};
pub use logging::{DisplayStore, PerfSpan, StoreDebug};
pub use property::{
    ChangeSignal, ObservableProperty, PropertyPlaceholder, PropertyValue, TypeDescriptor,
    ValueFactory,
};
pub use signal::{ConnectionId, Signal};
pub use store::{ReactiveStore, WatchHandle, WatchOptions, WeakStore};
