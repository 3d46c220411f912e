//! Error types for Horizon Veil core.

/// A specialized Result type for reactive store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the reactive property engine.
///
/// Only programming errors surface here. Everything environmental (missing
/// window, stale measurements, already-removed elements) is absorbed by the
/// layers above and never becomes an `Error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A cell was requested with a type other than the one it was created with.
    #[error("Property '{name}' type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The name of the offending cell.
        name: String,
        /// The type the caller asked for.
        expected: &'static str,
        /// The type the cell actually holds.
        found: &'static str,
    },

    /// The store was disposed and no longer accepts operations.
    #[error("Reactive store has been disposed")]
    Disposed,
}

impl Error {
    /// Create a type-mismatch fault for the named cell.
    pub fn type_mismatch(
        name: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            name: name.into(),
            expected,
            found,
        }
    }

    /// Whether this error is a type-mismatch fault.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }
}
