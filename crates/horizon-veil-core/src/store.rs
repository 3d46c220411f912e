//! Per-component reactive property store.
//!
//! A [`ReactiveStore`] gives one component instance a keyed bag of reactive
//! cells. Cells are created on first access (read, write or watch) and keep
//! their value type for the store's lifetime.
//!
//! # Operations
//!
//! - [`get_value`](ReactiveStore::get_value): read, materializing the default
//!   if the cell never had a value
//! - [`set_value`](ReactiveStore::set_value): write, notifying watchers on change
//! - [`get_computed_value`](ReactiveStore::get_computed_value): lazily derive a
//!   value and re-derive it when its dependencies change
//! - [`watch`](ReactiveStore::watch) and friends: subscribe to changes
//! - [`set_value_after`](ReactiveStore::set_value_after): defer a write until
//!   another property has been set
//!
//! # Concurrency
//!
//! The name table sits behind its own `RwLock` and every cell has its own
//! subscriber lock. Get-or-create runs under the table's upgradable read lock,
//! so concurrent callers asking for the same name always observe the same
//! cell. Notification never holds the table lock, so a subscriber may read,
//! write or watch other cells of the same store.
//!
//! # Example
//!
//! ```
//! use horizon_veil_core::{Dependencies, OwnerType, ReactiveStore};
//!
//! struct Counter;
//!
//! let store = ReactiveStore::new(OwnerType::of::<Counter>());
//! store.set_value("Count", 2_i32)?;
//!
//! let doubled = store.get_computed_value("Doubled", Dependencies::explicit(["Count"]), |s| {
//!     Ok(s.get_value("Count", 0_i32)? * 2)
//! })?;
//! assert_eq!(doubled, 4);
//!
//! store.set_value("Count", 5_i32)?;
//! assert_eq!(store.get_value("Doubled", 0_i32)?, 10);
//! # Ok::<(), horizon_veil_core::Error>(())
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock, RwLockUpgradableReadGuard};

use crate::dependency::{self, Dependencies, DependencyResolver, OwnerType};
use crate::error::{Error, Result};
use crate::logging::targets;
use crate::property::{
    ObservableProperty, PropertyPlaceholder, PropertySlot, PropertyValue, TypeDescriptor,
    ValueFactory,
};
use crate::signal::ConnectionId;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a single subscription made through a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchHandle {
    name: Arc<str>,
    id: ConnectionId,
}

impl WatchHandle {
    /// The watched property's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying connection.
    pub fn connection(&self) -> ConnectionId {
        self.id
    }
}

/// Options for [`ReactiveStore::watch_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchOptions {
    /// Invoke the callback once, right away, with `(T::default(), T::default())`.
    ///
    /// This is a "fire now" convenience: it does not pass the cell's current
    /// value.
    pub immediate: bool,
    /// Remove every existing subscriber of the cell before subscribing.
    pub override_existing: bool,
}

impl WatchOptions {
    /// Default options: not immediate, accumulate subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the callback once on registration.
    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Replace rather than accumulate subscribers.
    pub fn override_existing(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }
}

/// Key of a pending deferred write: (first property, target property).
type DeferredKey = (String, String);

pub(crate) struct StoreInner {
    id: u64,
    owner: OwnerType,
    properties: RwLock<HashMap<Arc<str>, PropertySlot>>,
    deferred: Mutex<HashMap<DeferredKey, WatchHandle>>,
    disposed: AtomicBool,
}

/// A keyed collection of reactive cells owned by one component instance.
///
/// `ReactiveStore` is a cheap, cloneable handle. Callbacks the store installs
/// on itself (computed recomputation, deferred writes) hold only a
/// [`WeakStore`], so a store is not kept alive by its own subscriptions.
#[derive(Clone)]
pub struct ReactiveStore {
    inner: Arc<StoreInner>,
}

/// A non-owning reference to a [`ReactiveStore`].
#[derive(Clone)]
pub struct WeakStore {
    inner: Weak<StoreInner>,
}

impl WeakStore {
    /// Upgrade to a store handle if the store is still alive.
    pub fn upgrade(&self) -> Option<ReactiveStore> {
        self.inner.upgrade().map(|inner| ReactiveStore { inner })
    }
}

impl ReactiveStore {
    /// Create an empty store for a component of type `owner`.
    pub fn new(owner: OwnerType) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
                owner,
                properties: RwLock::new(HashMap::new()),
                deferred: Mutex::new(HashMap::new()),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// The owning component's type descriptor.
    pub fn owner(&self) -> &OwnerType {
        &self.inner.owner
    }

    /// A process-unique identifier for this store.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// A weak handle to this store.
    pub fn downgrade(&self) -> WeakStore {
        WeakStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn ensure_live(&self) -> Result<()> {
        if self.inner.disposed.load(Ordering::Acquire) {
            Err(Error::Disposed)
        } else {
            Ok(())
        }
    }

    /// Get the typed cell for `name`, creating or promoting it as needed.
    ///
    /// Fails fast with [`Error::TypeMismatch`] if the name already holds a
    /// different type.
    pub fn property<T: PropertyValue>(&self, name: &str) -> Result<Arc<ObservableProperty<T>>> {
        self.ensure_live()?;

        if let Some(slot) = self.inner.properties.read().get(name) {
            if let Some(cell) = slot.downcast::<T>(name)? {
                return Ok(cell);
            }
        }

        let table = self.inner.properties.upgradable_read();
        let existing = table.get(name).cloned();
        match existing {
            Some(PropertySlot::Untyped(placeholder)) => {
                let cell = Arc::new(ObservableProperty::from_placeholder(&placeholder, T::default()));
                let mut table = RwLockUpgradableReadGuard::upgrade(table);
                table.insert(Arc::from(name), PropertySlot::typed(cell.clone()));
                tracing::trace!(
                    target: targets::STORE,
                    name,
                    ty = std::any::type_name::<T>(),
                    "promoted placeholder to typed cell"
                );
                Ok(cell)
            }
            // Another caller created it between our two lookups.
            Some(slot) => slot.downcast::<T>(name)?.ok_or_else(|| {
                Error::type_mismatch(name, std::any::type_name::<T>(), "<untyped>")
            }),
            None => {
                let cell = Arc::new(ObservableProperty::new(name, T::default()));
                let mut table = RwLockUpgradableReadGuard::upgrade(table);
                table.insert(Arc::from(name), PropertySlot::typed(cell.clone()));
                Ok(cell)
            }
        }
    }

    /// Get the slot for `name`, creating an untyped placeholder if absent.
    fn slot(&self, name: &str) -> Result<PropertySlot> {
        self.ensure_live()?;

        if let Some(slot) = self.inner.properties.read().get(name) {
            return Ok(slot.clone());
        }

        let mut table = self.inner.properties.write();
        let slot = table
            .entry(Arc::from(name))
            .or_insert_with(|| PropertySlot::Untyped(Arc::new(PropertyPlaceholder::new(name))));
        Ok(slot.clone())
    }

    /// Read the named value, creating the cell with `default` if absent.
    ///
    /// If the cell exists but never had a value, it adopts `default` and is
    /// marked as having a value.
    pub fn get_value<T: PropertyValue>(&self, name: &str, default: T) -> Result<T> {
        let cell = self.property::<T>(name)?;
        dependency::record_read(self.inner.id, name);
        Ok(cell.materialize(default))
    }

    /// Read the named value without materializing it.
    ///
    /// Returns `Ok(None)` if the cell is absent, untyped, or never had a value.
    pub fn peek<T: PropertyValue>(&self, name: &str) -> Result<Option<T>> {
        self.ensure_live()?;
        dependency::record_read(self.inner.id, name);
        let slot = self.inner.properties.read().get(name).cloned();
        match slot {
            Some(slot) => Ok(slot
                .downcast::<T>(name)?
                .filter(|cell| cell.has_value())
                .map(|cell| cell.get())),
            None => Ok(None),
        }
    }

    /// Write the named value, creating the cell if absent.
    ///
    /// Subscribers run synchronously, in subscription order, before this
    /// returns, and only if the value changed. Returns `Ok(true)` if they ran.
    /// A fault raised by any subscriber (including a computed cell recomputing
    /// further down the cascade) is returned here.
    #[tracing::instrument(skip_all, target = "horizon_veil_core::store", level = "trace", fields(name = name))]
    pub fn set_value<T: PropertyValue>(&self, name: &str, value: T) -> Result<bool> {
        let cell = self.property::<T>(name)?;
        cell.set(value)
    }

    /// Read a computed value, deriving it on first access.
    ///
    /// The first call stores `factory` on the cell, evaluates it once, writes
    /// the result, and wires a recompute from each dependency. If that first
    /// evaluation fails the factory is dropped again, so a later call starts
    /// over. Later calls
    /// return the cached value unchanged; the value only changes again when a
    /// dependency fires.
    pub fn get_computed_value<T, F>(
        &self,
        name: &str,
        dependencies: Dependencies,
        factory: F,
    ) -> Result<T>
    where
        T: PropertyValue,
        F: Fn(&ReactiveStore) -> Result<T> + Send + Sync + 'static,
    {
        let cell = self.property::<T>(name)?;
        dependency::record_read(self.inner.id, name);
        if cell.has_value() {
            return Ok(cell.get());
        }

        let factory: ValueFactory<T> = Arc::new(factory);
        if !cell.install_factory(factory.clone()) {
            // Someone else is already deriving this cell.
            return Ok(cell.get());
        }

        let resolver = DependencyResolver::new(&self.inner.owner, self.inner.id);
        let (value, names) = match resolver.resolve(name, &dependencies, || factory(self)) {
            Ok(resolved) => resolved,
            Err(err) => {
                // Nothing was written or wired; the next read evaluates again.
                cell.clear_factory();
                return Err(err);
            }
        };
        // The value is stored even if a subscriber fails, so wire the
        // dependencies before reporting it.
        let written = cell.set(value);

        for dependency in names {
            let store = self.downgrade();
            let factory = factory.clone();
            let target: Arc<str> = Arc::from(name);
            self.watch_untyped_fallible(&dependency, move || {
                let Some(store) = store.upgrade() else {
                    return Ok(());
                };
                let value = factory(&store)?;
                store.set_value(&target, value).map(|_| ())
            })?;
        }

        written?;
        Ok(cell.get())
    }

    /// Watch `(new, old)` changes of the named cell.
    pub fn watch<T, F>(&self, name: &str, callback: F) -> Result<WatchHandle>
    where
        T: PropertyValue,
        F: Fn(&T, &T) + Send + Sync + 'static,
    {
        self.watch_with(name, WatchOptions::default(), callback)
    }

    /// Watch `(new, old)` changes with explicit [`WatchOptions`].
    pub fn watch_with<T, F>(
        &self,
        name: &str,
        options: WatchOptions,
        callback: F,
    ) -> Result<WatchHandle>
    where
        T: PropertyValue,
        F: Fn(&T, &T) + Send + Sync + 'static,
    {
        if options.override_existing {
            self.unwatch(name)?;
        }

        let cell = self.property::<T>(name)?;
        let callback = Arc::new(callback);
        let subscriber = callback.clone();
        let id = cell.subscribe(move |new, old| {
            subscriber(new, old);
            Ok(())
        });

        if options.immediate {
            callback(&T::default(), &T::default());
        }

        Ok(WatchHandle {
            name: Arc::from(name),
            id,
        })
    }

    /// Watch the new value only.
    pub fn watch_value<T, F>(&self, name: &str, callback: F) -> Result<WatchHandle>
    where
        T: PropertyValue,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.watch::<T, _>(name, move |new, _| callback(new))
    }

    /// Watch the named cell without knowing its type.
    ///
    /// If the cell does not exist yet, an untyped placeholder is created; the
    /// subscription survives its later promotion to a typed cell.
    pub fn watch_untyped<F>(&self, name: &str, callback: F) -> Result<WatchHandle>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.watch_untyped_fallible(name, move || {
            callback();
            Ok(())
        })
    }

    fn watch_untyped_fallible<F>(&self, name: &str, callback: F) -> Result<WatchHandle>
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        let slot = self.slot(name)?;
        let id = slot.changed().connect_fallible(move |_| callback());
        Ok(WatchHandle {
            name: Arc::from(name),
            id,
        })
    }

    /// Write `value` to `name` once `first` has been set.
    ///
    /// If `first` already has a value the write happens now and any pending
    /// deferred write for the same pair is dropped. Otherwise a one-shot watch
    /// on `first` performs the write the next time it changes.
    pub fn set_value_after<T, TFirst>(&self, value: T, name: &str, first: &str) -> Result<()>
    where
        T: PropertyValue,
        TFirst: PropertyValue,
    {
        let first_cell = self.property::<TFirst>(first)?;
        let key: DeferredKey = (first.to_owned(), name.to_owned());

        if first_cell.has_value() {
            let pending = self.inner.deferred.lock().remove(&key);
            if let Some(handle) = pending {
                self.unwatch_one(&handle);
            }
            self.set_value(name, value)?;
            return Ok(());
        }

        let store = self.downgrade();
        let target: Arc<str> = Arc::from(name);
        let fired_key = key.clone();
        let handle = self.watch_untyped_fallible(first, move || {
            let Some(store) = store.upgrade() else {
                return Ok(());
            };
            let pending = store.inner.deferred.lock().remove(&fired_key);
            if let Some(handle) = pending {
                store.unwatch_one(&handle);
            }
            store.set_value(&target, value.clone()).map(|_| ())
        })?;

        let replaced = self.inner.deferred.lock().insert(key, handle);
        if let Some(previous) = replaced {
            self.unwatch_one(&previous);
        }
        Ok(())
    }

    /// Remove every subscriber of the named cell. The value is kept.
    ///
    /// Returns `Ok(false)` if no such cell exists.
    pub fn unwatch(&self, name: &str) -> Result<bool> {
        self.ensure_live()?;
        let slot = self.inner.properties.read().get(name).cloned();
        let Some(slot) = slot else {
            return Ok(false);
        };
        slot.changed().disconnect_all();
        self.inner.deferred.lock().retain(|(first, _), _| first != name);
        Ok(true)
    }

    /// Remove a single subscription.
    pub fn unwatch_one(&self, handle: &WatchHandle) -> bool {
        let slot = self.inner.properties.read().get(handle.name()).cloned();
        match slot {
            Some(slot) => slot.changed().disconnect(handle.id),
            None => false,
        }
    }

    /// Unregister the named cell entirely, dropping its value and subscribers.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.inner.properties.write().remove(name);
        match removed {
            Some(slot) => {
                slot.changed().disconnect_all();
                true
            }
            None => false,
        }
    }

    /// Whether a cell (typed or placeholder) exists under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.properties.read().contains_key(name)
    }

    /// Whether the named cell exists and has had a value set or materialized.
    pub fn has_value(&self, name: &str) -> bool {
        self.inner
            .properties
            .read()
            .get(name)
            .is_some_and(PropertySlot::has_value)
    }

    /// The value type of the named cell, if it is typed.
    pub fn type_of(&self, name: &str) -> Option<TypeDescriptor> {
        self.inner
            .properties
            .read()
            .get(name)
            .and_then(PropertySlot::descriptor)
    }

    /// The number of cells in the store.
    pub fn len(&self) -> usize {
        self.inner.properties.read().len()
    }

    /// Whether the store holds no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The names of all cells, in no particular order.
    pub fn names(&self) -> Vec<String> {
        self.inner
            .properties
            .read()
            .keys()
            .map(|name| name.to_string())
            .collect()
    }

    /// Release every cell and reject further operations.
    ///
    /// Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let slots: Vec<PropertySlot> = self.inner.properties.write().drain().map(|(_, slot)| slot).collect();
        for slot in &slots {
            slot.changed().disconnect_all();
        }
        self.inner.deferred.lock().clear();
        tracing::debug!(
            target: targets::STORE,
            owner = self.inner.owner.type_name(),
            cells = slots.len(),
            "reactive store disposed"
        );
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for ReactiveStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveStore")
            .field("id", &self.inner.id)
            .field("owner", &self.inner.owner.type_name())
            .field("cells", &self.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

static_assertions::assert_impl_all!(ReactiveStore: Send, Sync);
static_assertions::assert_impl_all!(WeakStore: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct Widget;

    fn store() -> ReactiveStore {
        ReactiveStore::new(OwnerType::of::<Widget>())
    }

    #[test]
    fn test_get_value_materializes_default() {
        let store = store();
        assert!(!store.contains("Size"));

        assert_eq!(store.get_value("Size", 4_u32).unwrap(), 4);
        assert!(store.has_value("Size"));
        // The first materialized default sticks.
        assert_eq!(store.get_value("Size", 9_u32).unwrap(), 4);
    }

    #[test]
    fn test_watch_created_cell_materializes_on_read() {
        let store = store();
        store.watch_value::<i32, _>("Count", |_| {}).unwrap();
        assert!(!store.has_value("Count"));

        assert_eq!(store.get_value("Count", 3).unwrap(), 3);
        assert!(store.has_value("Count"));
    }

    #[test]
    fn test_set_value_passes_previous_value_as_old() {
        let store = store();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        store
            .watch("Level", move |new: &i32, old: &i32| seen_clone.lock().push((*new, *old)))
            .unwrap();

        for value in [1, 2, 2, 5] {
            store.set_value("Level", value).unwrap();
        }

        assert_eq!(*seen.lock(), vec![(1, 0), (2, 1), (5, 2)]);
    }

    #[test]
    fn test_type_mismatch_fails_fast() {
        let store = store();
        store.set_value("Flag", true).unwrap();

        let err = store.get_value("Flag", 0_i32).unwrap_err();
        assert!(err.is_type_mismatch());
        // The existing cell is untouched.
        assert!(store.get_value("Flag", false).unwrap());
    }

    #[test]
    fn test_peek_does_not_materialize() {
        let store = store();
        assert_eq!(store.peek::<i32>("Missing").unwrap(), None);

        store.watch_value::<i32, _>("Later", |_| {}).unwrap();
        assert_eq!(store.peek::<i32>("Later").unwrap(), None);
        assert!(!store.has_value("Later"));

        store.set_value("Later", 8).unwrap();
        assert_eq!(store.peek::<i32>("Later").unwrap(), Some(8));
        assert!(store.peek::<bool>("Later").is_err());
    }

    #[test]
    fn test_untyped_watch_survives_promotion() {
        let store = store();
        let fired = Arc::new(AtomicUsize::new(0));

        let f = fired.clone();
        store
            .watch_untyped("Width", move || {
                f.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert!(store.type_of("Width").is_none());

        store.set_value("Width", 10.0_f64).unwrap();
        assert_eq!(store.type_of("Width").map(|d| d.type_name), Some("f64"));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_override_clears_existing_watchers() {
        let store = store();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let c = calls.clone();
        store.watch_value("Mode", move |v: &u8| c.lock().push(("old", *v))).unwrap();
        let c = calls.clone();
        store
            .watch_with(
                "Mode",
                WatchOptions::new().override_existing(true),
                move |v: &u8, _| c.lock().push(("new", *v)),
            )
            .unwrap();

        store.set_value("Mode", 3_u8).unwrap();
        assert_eq!(*calls.lock(), vec![("new", 3)]);
    }

    #[test]
    fn test_immediate_watch_passes_defaults() {
        let store = store();
        store.set_value("Name", "menu".to_string()).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        store
            .watch_with(
                "Name",
                WatchOptions::new().immediate(true),
                move |new: &String, old: &String| s.lock().push((new.clone(), old.clone())),
            )
            .unwrap();

        assert_eq!(*seen.lock(), vec![(String::new(), String::new())]);
    }

    #[test]
    fn test_unwatch_one_and_unwatch_keep_value() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));

        let c = calls.clone();
        let handle = store
            .watch_value("Open", move |_: &bool| {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(handle.name(), "Open");

        store.set_value("Open", true).unwrap();
        assert!(store.unwatch_one(&handle));
        store.set_value("Open", false).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(store.unwatch("Open").unwrap());
        assert!(!store.unwatch("Nope").unwrap());
        assert!(!store.get_value("Open", true).unwrap());
    }

    #[test]
    fn test_remove_destroys_cell() {
        let store = store();
        store.set_value("Temp", 1_i64).unwrap();
        assert!(store.remove("Temp"));
        assert!(!store.remove("Temp"));
        assert!(!store.contains("Temp"));

        // A new type is allowed after removal.
        store.set_value("Temp", "x".to_string()).unwrap();
    }

    #[test]
    fn test_computed_evaluates_once_until_dependency_changes() {
        let store = store();
        let evaluations = Arc::new(AtomicUsize::new(0));

        let compute = |store: &ReactiveStore, evaluations: &Arc<AtomicUsize>| {
            let e = evaluations.clone();
            store.get_computed_value("Area", Dependencies::explicit(["W", "H"]), move |s| {
                e.fetch_add(1, Ordering::SeqCst);
                Ok(s.get_value("W", 2_i32)? * s.get_value("H", 3_i32)?)
            })
        };

        assert_eq!(compute(&store, &evaluations).unwrap(), 6);
        assert_eq!(compute(&store, &evaluations).unwrap(), 6);
        assert_eq!(compute(&store, &evaluations).unwrap(), 6);
        assert_eq!(evaluations.load(Ordering::SeqCst), 1);

        store.set_value("Unrelated", 1_i32).unwrap();
        assert_eq!(evaluations.load(Ordering::SeqCst), 1);

        store.set_value("W", 10_i32).unwrap();
        assert_eq!(evaluations.load(Ordering::SeqCst), 2);
        assert_eq!(store.get_value("Area", 0_i32).unwrap(), 30);
    }

    #[test]
    fn test_computed_dependency_change_sets_once() {
        let store = store();
        let sets = Arc::new(AtomicUsize::new(0));

        store
            .get_computed_value("Label", Dependencies::explicit(["Count"]), |s| {
                Ok(format!("{} items", s.get_value("Count", 0_u32)?))
            })
            .unwrap();

        let s = sets.clone();
        store
            .watch_value("Label", move |_: &String| {
                s.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        store.set_value("Count", 4_u32).unwrap();
        assert_eq!(sets.load(Ordering::SeqCst), 1);
        assert_eq!(store.get_value("Label", String::new()).unwrap(), "4 items");
    }

    #[test]
    fn test_inferred_dependencies_track_store_reads() {
        let store = store();
        let other = ReactiveStore::new(OwnerType::of::<u8>());
        other.set_value("Scale", 2_i32).unwrap();

        let foreign = other.clone();
        store
            .get_computed_value("Scaled", Dependencies::Inferred, move |s| {
                Ok(s.get_value("Base", 5_i32)? * foreign.get_value("Scale", 1_i32)?)
            })
            .unwrap();
        assert_eq!(store.get_value("Scaled", 0_i32).unwrap(), 10);

        // A read through another store is not a dependency.
        other.set_value("Scale", 3_i32).unwrap();
        assert_eq!(store.get_value("Scaled", 0_i32).unwrap(), 10);

        store.set_value("Base", 7_i32).unwrap();
        assert_eq!(store.get_value("Scaled", 0_i32).unwrap(), 21);
    }

    #[test]
    fn test_recompute_fault_reaches_setter() {
        let store = store();
        store
            .get_computed_value("Broken", Dependencies::explicit(["Source"]), |s| {
                let source = s.get_value("Source", 0_i32)?;
                if source > 0 {
                    // Reads an i32 cell as a bool.
                    s.get_value("Source", false)?;
                }
                Ok(source)
            })
            .unwrap();

        let err = store.set_value("Source", 1_i32).unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn test_set_value_after_immediate_when_first_set() {
        let store = store();
        store.set_value("Items", 3_usize).unwrap();

        store.set_value_after::<i32, usize>(5, "Selected", "Items").unwrap();
        assert_eq!(store.peek::<i32>("Selected").unwrap(), Some(5));
    }

    #[test]
    fn test_set_value_after_defers_until_first_set() {
        let store = store();
        let other_calls = Arc::new(AtomicUsize::new(0));
        let c = other_calls.clone();
        store
            .watch_value("Items", move |_: &usize| {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        store.set_value_after::<i32, usize>(5, "Selected", "Items").unwrap();
        assert_eq!(store.peek::<i32>("Selected").unwrap(), None);

        store.set_value("Items", 2_usize).unwrap();
        assert_eq!(store.peek::<i32>("Selected").unwrap(), Some(5));

        // One-shot: a later user write to Selected is not overwritten.
        store.set_value("Selected", 9_i32).unwrap();
        store.set_value("Items", 4_usize).unwrap();
        assert_eq!(store.peek::<i32>("Selected").unwrap(), Some(9));

        // Other watchers of the first property are untouched.
        assert_eq!(other_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dispose_rejects_operations() {
        let store = store();
        store.set_value("A", 1_i32).unwrap();
        store.dispose();
        store.dispose();

        assert!(store.is_disposed());
        assert!(store.is_empty());
        assert_eq!(store.set_value("A", 2_i32).unwrap_err(), Error::Disposed);
    }

    #[test]
    fn test_concurrent_get_or_create_yields_same_cell() {
        let store = store();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.property::<u64>("Shared").unwrap())
            })
            .collect();

        let cells: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for cell in &cells[1..] {
            assert!(Arc::ptr_eq(&cells[0], cell));
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_watcher_can_write_other_cells() {
        let store = store();
        let weak = store.downgrade();
        store
            .watch_value("Celsius", move |c: &f64| {
                if let Some(store) = weak.upgrade() {
                    store.set_value("Fahrenheit", c * 9.0 / 5.0 + 32.0).unwrap();
                }
            })
            .unwrap();

        store.set_value("Celsius", 100.0_f64).unwrap();
        assert_eq!(store.peek::<f64>("Fahrenheit").unwrap(), Some(212.0));
    }
}
