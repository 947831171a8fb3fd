//! Window resolution — which on-screen window a gaze point lands on.
//!
//! The window system is reached only through the [`WindowSnapshotProvider`]
//! and [`ZOrderOracle`] traits; the X11 adapter lives in `crate::display::x11`.

pub mod active;
pub mod geometry;
pub mod snapshot;
pub mod zorder;

pub use active::ActiveWindowResolver;
pub use geometry::{GazePoint, Rect};
pub use snapshot::{WindowHandle, WindowSnapshot, WindowSnapshotProvider};
pub use zorder::{StackingOrder, ZOrderOracle};

/// Window system and z-order failures.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    /// The X11 connection or a request on it failed.
    #[error("x11: {0}")]
    X11(String),
    /// Neither window was found while scanning the stacking order, e.g.
    /// both closed between the snapshot and the query.
    #[error("neither {a} nor {b} is in the stacking order")]
    NotStacked { a: WindowHandle, b: WindowHandle },
}
