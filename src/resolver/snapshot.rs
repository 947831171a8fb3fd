//! WindowSnapshotProvider trait — point-in-time view of on-screen windows.

use std::fmt;

use super::ResolverError;
use super::geometry::Rect;

/// Opaque window token (the X11 XID).
///
/// The window system owns the window; holding a handle keeps nothing alive
/// and the window may be gone by the time the handle is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u32);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// One visible window at the instant the snapshot was taken.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSnapshot {
    pub handle: WindowHandle,
    /// Window title. Never empty.
    pub title: String,
    /// Normal (non-minimized) position in root coordinates.
    pub rect: Rect,
}

/// Enumerates the windows a user could currently be looking at.
///
/// Platform adapters implement this trait so the resolver never talks to
/// the window system directly. A snapshot is only valid for the instant it
/// was taken: callers ask again for every fixation and never cache it.
pub trait WindowSnapshotProvider {
    /// Return every visible, non-minimized window with a non-empty title,
    /// excluding the desktop/shell window.
    fn snapshot(&self) -> Result<Vec<WindowSnapshot>, ResolverError>;
}
