//! Ordered multicast notification for Horizon Veil.
//!
//! A [`Signal`] holds an ordered list of slots (callbacks) and invokes them in
//! connection order whenever it is emitted. It is the change-notification
//! backbone of every reactive cell: each cell owns one signal, and watching a
//! cell means connecting a slot to it.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The signal itself
//! - [`ConnectionId`] - Identifier returned when connecting a slot
//!
//! # Re-entrancy
//!
//! Emission snapshots the slot list and releases the connection lock before
//! invoking anything, so a slot may freely connect, disconnect, or emit other
//! signals (including this one). A slot disconnected during an emission still
//! runs for that emission; it is skipped from the next one on.
//!
//! # Errors
//!
//! Slots are fallible. Every slot runs even if an earlier one failed, and the
//! first error is returned from [`Signal::emit`]. This lets a fault raised deep
//! inside a notification cascade reach the caller that started it.
//!
//! # Example
//!
//! ```
//! use horizon_veil_core::Signal;
//!
//! let resized = Signal::<(f64, f64)>::new();
//! let id = resized.connect(|(w, h)| println!("resized to {w}x{h}"));
//!
//! resized.emit(&(800.0, 600.0)).unwrap();
//! resized.disconnect(id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::error::{Error, Result};
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    pub struct ConnectionId;
}

/// A connected slot.
type Slot<Args> = Arc<dyn Fn(&Args) -> Result<()> + Send + Sync>;

/// Slot storage plus registration order.
///
/// `SlotMap` reuses vacated slots, so its iteration order is not connection
/// order; `order` keeps the latter.
struct Connections<Args: ?Sized> {
    slots: SlotMap<ConnectionId, Slot<Args>>,
    order: Vec<ConnectionId>,
}

impl<Args: ?Sized> Connections<Args> {
    fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            order: Vec::new(),
        }
    }
}

/// A signal that invokes its connected slots in connection order.
///
/// `Args` may be unsized: reactive cells use `Signal<dyn Any>` so that typed
/// and untyped watchers share a single ordered list.
///
/// # Thread Safety
///
/// `Signal<Args>` is `Send + Sync`; slots must be `Send + Sync` too.
pub struct Signal<Args: ?Sized> {
    connections: Mutex<Connections<Args>>,
    blocked: AtomicBool,
}

impl<Args: ?Sized> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: ?Sized> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(Connections::new()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect an infallible slot.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connect_fallible(move |args| {
            slot(args);
            Ok(())
        })
    }

    /// Connect a slot whose failure is reported back to the emitter.
    pub fn connect_fallible<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) -> Result<()> + Send + Sync + 'static,
    {
        let mut connections = self.connections.lock();
        let id = connections.slots.insert(Arc::new(slot));
        connections.order.push(id);
        id
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let mut connections = self.connections.lock();
        if connections.slots.remove(id).is_some() {
            connections.order.retain(|existing| *existing != id);
            true
        } else {
            false
        }
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        let mut connections = self.connections.lock();
        connections.slots.clear();
        connections.order.clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().slots.len()
    }

    /// Block signal emission temporarily.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking every connected slot in connection order.
    ///
    /// Runs synchronously; all slots have returned by the time this does.
    /// Returns the first slot error, if any.
    #[tracing::instrument(skip_all, target = "horizon_veil_core::signal", level = "trace")]
    pub fn emit(&self, args: &Args) -> Result<()> {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return Ok(());
        }

        let slots: Vec<Slot<Args>> = {
            let connections = self.connections.lock();
            connections
                .order
                .iter()
                .filter_map(|id| connections.slots.get(*id).cloned())
                .collect()
        };
        tracing::trace!(target: targets::SIGNAL, connection_count = slots.len(), "emitting signal");

        let mut first_error: Option<Error> = None;
        for slot in slots {
            if let Err(err) = slot(args) {
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

static_assertions::assert_impl_all!(Signal<i32>: Send, Sync);
static_assertions::assert_impl_all!(Signal<dyn std::any::Any>: Send, Sync);
