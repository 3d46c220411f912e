//! Z-index arbitration among open overlays.
//!
//! A newly shown overlay must render above every overlay already open. The
//! [`StackingArbiter`] picks its z-index from the highest index currently in
//! use, as reported by the host's [`DomAdapter`](crate::DomAdapter).
//!
//! # Usage
//!
//! ```
//! use horizon_veil::{Length, StackingArbiter};
//!
//! let arbiter = StackingArbiter::default();
//! assert_eq!(arbiter.next_z_index(None, 10), 12);
//! assert_eq!(arbiter.next_z_index(None, 2), 8);
//! assert_eq!(arbiter.next_z_index(Some(&Length::px(50.0)), 99), 50);
//! ```

use crate::length::Length;

/// The default z-index base overlays stack on.
pub const DEFAULT_STACK_FLOOR: i32 = 6;

/// Gap between the highest open overlay and a newly shown one.
///
/// One layer is left free so a just-closed overlay's residual index never
/// collides with the new one.
const STACK_STEP: i32 = 2;

/// Computes the z-index of a newly shown overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackingArbiter {
    floor: i32,
}

impl StackingArbiter {
    /// Create an arbiter with the given stack floor.
    pub fn new(floor: i32) -> Self {
        Self { floor }
    }

    /// The stack floor.
    pub fn floor(&self) -> i32 {
        self.floor
    }

    /// The z-index to assign to an overlay being shown.
    ///
    /// # Arguments
    ///
    /// * `explicit` - The overlay's configured z-index, if any
    /// * `current_max` - The highest z-index among the other open overlays
    ///
    /// # Returns
    ///
    /// The explicit z-index if it rounds to a positive integer; otherwise `max(current_max, floor) + 2`.
    pub fn next_z_index(&self, explicit: Option<&Length>, current_max: i32) -> i32 {
        if let Some(z_index) = Self::explicit_z_index(explicit) {
            return z_index;
        }
        current_max.max(self.floor).saturating_add(STACK_STEP)
    }

    /// The usable part of an explicit z-index override.
    pub fn explicit_z_index(explicit: Option<&Length>) -> Option<i32> {
        explicit
            .and_then(Length::as_number)
            .map(|z_index| z_index.round() as i32)
            .filter(|z_index| *z_index > 0)
    }
}

impl Default for StackingArbiter {
    fn default() -> Self {
        Self::new(DEFAULT_STACK_FLOOR)
    }
}
