//! Dependency resolution for computed cells.
//!
//! A computed cell re-derives its value whenever one of its dependencies
//! changes. Dependencies come from one of two places:
//!
//! - [`Dependencies::Explicit`]: a caller-supplied list of property names,
//!   used verbatim. This is the primary, always-reliable path.
//! - [`Dependencies::Inferred`]: the factory is evaluated once inside a
//!   read-tracking frame and every property it reads *through the owning
//!   store* becomes a dependency. Reads through other stores (unrelated
//!   owners, captured helpers) are not tracked.
//!
//! When the owner declares its reactive properties (see
//! [`OwnerType::with_properties`]), inferred reads are further narrowed to that
//! declared set.

use std::any::{TypeId, type_name};
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::logging::targets;

/// Identifies the component type that owns a reactive store.
#[derive(Clone)]
pub struct OwnerType {
    type_name: &'static str,
    type_id: TypeId,
    declared: Option<Arc<[&'static str]>>,
}

impl OwnerType {
    /// Describe the owner type `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            type_name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            declared: None,
        }
    }

    /// Restrict inferred dependencies to the given reactive property names.
    pub fn with_properties(mut self, names: &[&'static str]) -> Self {
        self.declared = Some(names.into());
        self
    }

    /// The owner's type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The owner's `TypeId`.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Whether `name` belongs to the owner's reactive state.
    ///
    /// Owners that declare no property list accept every name read through
    /// their store.
    pub fn declares(&self, name: &str) -> bool {
        match &self.declared {
            Some(declared) => declared.iter().any(|declared| *declared == name),
            None => true,
        }
    }
}

impl fmt::Debug for OwnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerType")
            .field("type_name", &self.type_name)
            .field("declared", &self.declared)
            .finish()
    }
}

/// How a computed cell's dependencies are determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependencies {
    /// Use exactly these names; no inference.
    Explicit(Vec<String>),
    /// Record the names the factory reads during its first evaluation.
    Inferred,
}

impl Dependencies {
    /// Build an explicit dependency list.
    pub fn explicit<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Explicit(names.into_iter().map(Into::into).collect())
    }

    /// No dependencies: the value is computed once and never re-derived.
    pub fn none() -> Self {
        Self::Explicit(Vec::new())
    }
}

struct TrackingFrame {
    store_id: u64,
    reads: Vec<String>,
}

thread_local! {
    static TRACKING: RefCell<Vec<TrackingFrame>> = const { RefCell::new(Vec::new()) };
}

/// Record that `name` was read through the store `store_id`.
///
/// Only the innermost frame records, and only reads made through the store
/// that opened it.
pub(crate) fn record_read(store_id: u64, name: &str) {
    TRACKING.with(|frames| {
        let mut frames = frames.borrow_mut();
        if let Some(frame) = frames.last_mut() {
            if frame.store_id == store_id && !frame.reads.iter().any(|read| read == name) {
                frame.reads.push(name.to_owned());
            }
        }
    });
}

/// Pops the frame it pushed, including on early return or unwind.
struct FrameGuard;

impl FrameGuard {
    fn push(store_id: u64) -> Self {
        TRACKING.with(|frames| {
            frames.borrow_mut().push(TrackingFrame {
                store_id,
                reads: Vec::new(),
            });
        });
        FrameGuard
    }

    fn finish(self) -> Vec<String> {
        let reads = TRACKING.with(|frames| {
            frames
                .borrow_mut()
                .pop()
                .map(|frame| frame.reads)
                .unwrap_or_default()
        });
        std::mem::forget(self);
        reads
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        TRACKING.with(|frames| {
            frames.borrow_mut().pop();
        });
    }
}

/// Works out which properties a computed cell depends on.
#[derive(Debug)]
pub struct DependencyResolver<'a> {
    owner: &'a OwnerType,
    store_id: u64,
}

impl<'a> DependencyResolver<'a> {
    /// Create a resolver for the store `store_id` owned by `owner`.
    pub fn new(owner: &'a OwnerType, store_id: u64) -> Self {
        Self { owner, store_id }
    }

    /// Evaluate `evaluate` once and return its value with the distinct list of
    /// dependency names for the computed cell `target`.
    ///
    /// Explicit lists are returned verbatim apart from de-duplication. Inferred
    /// lists keep first-read order, drop names the owner does not declare, and
    /// never contain `target` itself.
    pub fn resolve<T, F>(
        &self,
        target: &str,
        dependencies: &Dependencies,
        evaluate: F,
    ) -> Result<(T, Vec<String>)>
    where
        F: FnOnce() -> Result<T>,
    {
        match dependencies {
            Dependencies::Explicit(names) => {
                let value = evaluate()?;
                let mut distinct: Vec<String> = Vec::with_capacity(names.len());
                for name in names {
                    if !distinct.contains(name) {
                        distinct.push(name.clone());
                    }
                }
                Ok((value, distinct))
            }
            Dependencies::Inferred => {
                let guard = FrameGuard::push(self.store_id);
                let value = evaluate()?;
                let reads = guard.finish();
                let names = reads
                    .into_iter()
                    .filter(|name| name != target && self.owner.declares(name))
                    .collect::<Vec<_>>();
                tracing::trace!(
                    target: targets::STORE,
                    owner = self.owner.type_name(),
                    computed = target,
                    ?names,
                    "inferred computed dependencies"
                );
                Ok((value, names))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Menu;

    #[test]
    fn test_explicit_list_is_deduplicated_verbatim() {
        let owner = OwnerType::of::<Menu>();
        let resolver = DependencyResolver::new(&owner, 1);
        let deps = Dependencies::explicit(["Left", "Top", "Left"]);

        let (value, names) = resolver.resolve("Position", &deps, || Ok(3)).unwrap();
        assert_eq!(value, 3);
        assert_eq!(names, vec!["Left".to_string(), "Top".to_string()]);
    }

    #[test]
    fn test_inferred_records_only_matching_store() {
        let owner = OwnerType::of::<Menu>();
        let resolver = DependencyResolver::new(&owner, 7);

        let (_, names) = resolver
            .resolve("Sum", &Dependencies::Inferred, || {
                record_read(7, "A");
                record_read(8, "Foreign");
                record_read(7, "B");
                record_read(7, "A");
                record_read(7, "Sum");
                Ok(())
            })
            .unwrap();

        assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_inferred_respects_declared_properties() {
        let owner = OwnerType::of::<Menu>().with_properties(&["A"]);
        let resolver = DependencyResolver::new(&owner, 1);

        let (_, names) = resolver
            .resolve("Sum", &Dependencies::Inferred, || {
                record_read(1, "A");
                record_read(1, "Scratch");
                Ok(())
            })
            .unwrap();

        assert_eq!(names, vec!["A".to_string()]);
    }

    #[test]
    fn test_nested_frames_record_innermost_only() {
        let owner = OwnerType::of::<Menu>();
        let outer = DependencyResolver::new(&owner, 1);

        let (inner_names, outer_names) = outer
            .resolve("Outer", &Dependencies::Inferred, || {
                record_read(1, "X");
                let inner = DependencyResolver::new(&owner, 1);
                let (_, names) = inner.resolve("Inner", &Dependencies::Inferred, || {
                    record_read(1, "Y");
                    Ok(())
                })?;
                Ok(names)
            })
            .unwrap();

        assert_eq!(inner_names, vec!["Y".to_string()]);
        assert_eq!(outer_names, vec!["X".to_string()]);
    }

    #[test]
    fn test_frame_popped_on_error() {
        let owner = OwnerType::of::<Menu>();
        let resolver = DependencyResolver::new(&owner, 1);

        let result: Result<((), Vec<String>)> = resolver.resolve("Broken", &Dependencies::Inferred, || {
            Err(crate::Error::Disposed)
        });
        assert!(result.is_err());

        // No frame left behind: a read outside any resolution records nothing.
        record_read(1, "Stray");
        TRACKING.with(|frames| assert!(frames.borrow().is_empty()));
    }

    #[test]
    fn test_owner_type_name() {
        let owner = OwnerType::of::<Menu>();
        assert!(owner.type_name().ends_with("Menu"));
        assert_eq!(owner.type_id(), TypeId::of::<Menu>());
        assert!(owner.declares("anything"));
    }
}
