//! Reactive cells for Horizon Veil.
//!
//! A cell is a single named reactive value slot. It comes in two shapes:
//!
//! - **[`ObservableProperty<T>`]**: a typed cell holding a value, a
//!   "has value" flag, an optional value factory (for computed cells) and an
//!   ordered change signal.
//! - **[`PropertyPlaceholder`]**: an untyped cell created when something
//!   watches a name before anyone has said what type lives there. It only
//!   carries subscribers.
//!
//! A placeholder is promoted to a typed cell the first time the name is used
//! with a concrete type. Promotion moves the placeholder's change signal into
//! the typed cell, so early watchers keep their position and their
//! [`ConnectionId`]s.
//!
//! `PropertySlot` is the tagged variant the store keeps per name: it carries
//! an explicit typed/untyped discriminant plus a [`TypeDescriptor`], which makes
//! promotion and type checks ordinary checked operations.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::signal::{ConnectionId, Signal};
use crate::store::ReactiveStore;

/// Bounds every value stored in a reactive cell must satisfy.
///
/// `Default` supplies the value of a cell created by a watch or a write
/// before any read provided a default; `PartialEq` decides whether a write is
/// a change.
pub trait PropertyValue: Clone + PartialEq + Default + Send + Sync + 'static {}

impl<T> PropertyValue for T where T: Clone + PartialEq + Default + Send + Sync + 'static {}

/// The factory of a computed cell.
pub type ValueFactory<T> = Arc<dyn Fn(&ReactiveStore) -> Result<T> + Send + Sync>;

/// The change signal shared by a placeholder and the typed cell it becomes.
///
/// Typed emissions carry a `(new, old)` tuple as `&dyn Any`.
pub type ChangeSignal = Signal<dyn Any>;

/// Runtime identity of a cell's value type.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// The `TypeId` used for checks.
    pub type_id: TypeId,
    /// The type name used in diagnostics.
    pub type_name: &'static str,
}

impl TypeDescriptor {
    /// Describe `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

struct CellState<T> {
    value: T,
    has_value: bool,
    factory: Option<ValueFactory<T>>,
}

/// A typed reactive cell.
///
/// Writes go through [`set`](Self::set), which stores the value, marks the
/// cell as having a value, and notifies subscribers with `(new, old)` only
/// when the value actually changed. Notification is synchronous and in
/// subscription order.
pub struct ObservableProperty<T> {
    name: Arc<str>,
    state: RwLock<CellState<T>>,
    changed: Arc<ChangeSignal>,
}

impl<T: PropertyValue> ObservableProperty<T> {
    /// Create a cell holding `initial` that has not been given a value yet.
    pub fn new(name: impl Into<Arc<str>>, initial: T) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(CellState {
                value: initial,
                has_value: false,
                factory: None,
            }),
            changed: Arc::new(ChangeSignal::new()),
        }
    }

    /// Promote an untyped placeholder, inheriting its subscribers.
    pub fn from_placeholder(placeholder: &PropertyPlaceholder, initial: T) -> Self {
        Self {
            name: placeholder.name.clone(),
            state: RwLock::new(CellState {
                value: initial,
                has_value: false,
                factory: None,
            }),
            changed: placeholder.changed.clone(),
        }
    }

    /// The cell's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the current value.
    pub fn get(&self) -> T {
        self.state.read().value.clone()
    }

    /// Whether the cell was ever given a value.
    pub fn has_value(&self) -> bool {
        self.state.read().has_value
    }

    /// Return the value, first adopting `default` if the cell never had one.
    ///
    /// Materializing does not notify subscribers.
    pub fn materialize(&self, default: T) -> T {
        {
            let state = self.state.read();
            if state.has_value {
                return state.value.clone();
            }
        }
        let mut state = self.state.write();
        if !state.has_value {
            state.value = default;
            state.has_value = true;
        }
        state.value.clone()
    }

    /// Store `value` and notify subscribers if it differs from the old one.
    ///
    /// Returns `Ok(true)` if subscribers were notified. The first subscriber
    /// error is returned after every subscriber has run.
    pub fn set(&self, value: T) -> Result<bool> {
        let old = {
            let mut state = self.state.write();
            state.has_value = true;
            if state.value == value {
                return Ok(false);
            }
            std::mem::replace(&mut state.value, value.clone())
        };
        let change: (T, T) = (value, old);
        self.changed.emit(&change)?;
        Ok(true)
    }

    /// Install a computed-value factory.
    ///
    /// Returns `false` (and leaves the cell untouched) if a factory is already
    /// installed, so concurrent first reads of a computed cell evaluate and
    /// wire dependencies only once.
    pub fn install_factory(&self, factory: ValueFactory<T>) -> bool {
        let mut state = self.state.write();
        if state.factory.is_some() {
            return false;
        }
        state.factory = Some(factory);
        true
    }

    /// Drop the installed factory after a failed first evaluation.
    pub(crate) fn clear_factory(&self) {
        self.state.write().factory = None;
    }

    /// Subscribe to `(new, old)` changes.
    pub fn subscribe<F>(&self, callback: F) -> ConnectionId
    where
        F: Fn(&T, &T) -> Result<()> + Send + Sync + 'static,
    {
        self.changed.connect_fallible(move |args: &dyn Any| {
            match args.downcast_ref::<(T, T)>() {
                Some((new, old)) => callback(new, old),
                None => Ok(()),
            }
        })
    }

    /// The cell's change signal.
    pub fn changed(&self) -> &Arc<ChangeSignal> {
        &self.changed
    }
}

impl<T: PropertyValue + fmt::Debug> fmt::Debug for ObservableProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("ObservableProperty")
            .field("name", &self.name)
            .field("value", &state.value)
            .field("has_value", &state.has_value)
            .field("computed", &state.factory.is_some())
            .field("subscribers", &self.changed.connection_count())
            .finish()
    }
}

/// An untyped cell: a name and its subscribers, no value.
pub struct PropertyPlaceholder {
    name: Arc<str>,
    changed: Arc<ChangeSignal>,
}

impl PropertyPlaceholder {
    /// Create a placeholder for `name`.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            changed: Arc::new(ChangeSignal::new()),
        }
    }

    /// The placeholder's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The placeholder's change signal.
    pub fn changed(&self) -> &Arc<ChangeSignal> {
        &self.changed
    }
}

impl fmt::Debug for PropertyPlaceholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyPlaceholder")
            .field("name", &self.name)
            .field("subscribers", &self.changed.connection_count())
            .finish()
    }
}

/// Type-erased view of a typed cell.
pub(crate) trait ErasedProperty: Send + Sync {
    fn has_value(&self) -> bool;
    fn changed(&self) -> &Arc<ChangeSignal>;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: PropertyValue> ErasedProperty for ObservableProperty<T> {
    fn has_value(&self) -> bool {
        ObservableProperty::has_value(self)
    }

    fn changed(&self) -> &Arc<ChangeSignal> {
        ObservableProperty::changed(self)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// What the store keeps under each name.
#[derive(Clone)]
pub(crate) enum PropertySlot {
    /// Watched before its type was known.
    Untyped(Arc<PropertyPlaceholder>),
    /// A typed cell with a fixed value type.
    Typed {
        descriptor: TypeDescriptor,
        cell: Arc<dyn ErasedProperty>,
    },
}

impl PropertySlot {
    pub(crate) fn typed<T: PropertyValue>(cell: Arc<ObservableProperty<T>>) -> Self {
        Self::Typed {
            descriptor: TypeDescriptor::of::<T>(),
            cell,
        }
    }

    pub(crate) fn changed(&self) -> &Arc<ChangeSignal> {
        match self {
            Self::Untyped(placeholder) => placeholder.changed(),
            Self::Typed { cell, .. } => cell.changed(),
        }
    }

    pub(crate) fn has_value(&self) -> bool {
        match self {
            Self::Untyped(_) => false,
            Self::Typed { cell, .. } => cell.has_value(),
        }
    }

    pub(crate) fn descriptor(&self) -> Option<TypeDescriptor> {
        match self {
            Self::Untyped(_) => None,
            Self::Typed { descriptor, .. } => Some(*descriptor),
        }
    }

    /// Resolve a typed slot as `ObservableProperty<T>`, failing fast on a
    /// type mismatch. Untyped slots yield `Ok(None)`.
    pub(crate) fn downcast<T: PropertyValue>(
        &self,
        name: &str,
    ) -> Result<Option<Arc<ObservableProperty<T>>>> {
        match self {
            Self::Untyped(_) => Ok(None),
            Self::Typed { descriptor, cell } => {
                if descriptor.type_id != TypeId::of::<T>() {
                    return Err(Error::type_mismatch(
                        name,
                        type_name::<T>(),
                        descriptor.type_name,
                    ));
                }
                Arc::clone(cell)
                    .into_any()
                    .downcast::<ObservableProperty<T>>()
                    .map(Some)
                    .map_err(|_| Error::type_mismatch(name, type_name::<T>(), descriptor.type_name))
            }
        }
    }
}
