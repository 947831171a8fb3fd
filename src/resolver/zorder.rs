//! ZOrderOracle trait — front-to-back ordering of two windows.

use super::ResolverError;
use super::snapshot::WindowHandle;

/// Answers "which of these two windows is closer to the front?".
pub trait ZOrderOracle {
    /// `Ok(true)` if `a` is stacked above `b`, `Ok(false)` if `b` is above
    /// `a`. Errors when neither window is found, e.g. both closed since the
    /// snapshot was taken.
    fn is_above(&self, a: WindowHandle, b: WindowHandle) -> Result<bool, ResolverError>;
}

/// A stacking order captured as a list, frontmost first.
///
/// The X11 adapter builds one per query from `_NET_CLIENT_LIST_STACKING`;
/// tests use it directly as an oracle.
#[derive(Debug, Clone, Default)]
pub struct StackingOrder {
    front_to_back: Vec<WindowHandle>,
}

impl StackingOrder {
    /// Build from a list ordered frontmost first.
    pub fn front_to_back(front_to_back: Vec<WindowHandle>) -> Self {
        Self { front_to_back }
    }

    /// Build from a list ordered bottommost first, as EWMH reports it.
    pub fn bottom_to_top(mut bottom_to_top: Vec<WindowHandle>) -> Self {
        bottom_to_top.reverse();
        Self::front_to_back(bottom_to_top)
    }
}

impl ZOrderOracle for StackingOrder {
    /// Scan front to back; whichever window appears first is above.
    ///
    /// Only one of the two has to be present: a window that vanished is
    /// treated as below the one that is still stacked.
    fn is_above(&self, a: WindowHandle, b: WindowHandle) -> Result<bool, ResolverError> {
        for &handle in &self.front_to_back {
            if handle == a {
                return Ok(true);
            }
            if handle == b {
                return Ok(false);
            }
        }
        Err(ResolverError::NotStacked { a, b })
    }
}
