//! Error types for the overlay engine.

use crate::dom::ElementRef;

/// Result type alias for overlay operations.
pub type Result<T> = std::result::Result<T, OverlayError>;

/// Errors that can occur in the overlay engine.
///
/// Only store faults reach callers of the controller. Adapter failures are
/// reported by [`DomAdapter`](crate::DomAdapter) implementations and absorbed
/// by the controller, which logs them and carries on.
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    /// A reactive store fault, such as a type mismatch on a controller cell.
    #[error(transparent)]
    Store(#[from] horizon_veil_core::Error),

    /// The adapter has no element for the given reference.
    #[error("Element '{0}' is not present")]
    ElementMissing(ElementRef),

    /// The adapter failed to carry out a host operation.
    #[error("DOM adapter error: {0}")]
    Adapter(String),
}

impl OverlayError {
    /// Create an adapter error.
    pub fn adapter(message: impl Into<String>) -> Self {
        Self::Adapter(message.into())
    }
}
