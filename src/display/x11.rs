//! X11 integration — connection, window snapshots, stacking order queries.
//!
//! Wraps `x11rb::rust_connection::RustConnection` and reads the EWMH
//! properties a compliant window manager maintains on the root window and
//! on each client. Every query goes to the server; nothing is cached
//! between calls because windows move, minimize and close at any time.

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{self, Atom, AtomEnum, MapState, Window};
use x11rb::rust_connection::RustConnection;

use crate::resolver::{
    Rect, ResolverError, StackingOrder, WindowHandle, WindowSnapshot, WindowSnapshotProvider,
    ZOrderOracle,
};

/// Upper bound on property lengths read, in 32-bit units.
const MAX_PROPERTY_LEN: u32 = 4096;

/// Pre-interned X11 atoms for property queries.
struct Atoms {
    net_client_list_stacking: Atom,
    net_wm_name: Atom,
    utf8_string: Atom,
    net_wm_state: Atom,
    net_wm_state_hidden: Atom,
    net_wm_window_type: Atom,
    net_wm_window_type_desktop: Atom,
}

/// X11 connection context for window resolution.
pub struct X11Display {
    conn: RustConnection,
    root: Window,
    atoms: Atoms,
}

impl X11Display {
    /// Connect to the X11 display and intern required atoms.
    pub fn connect() -> Result<Self, ResolverError> {
        let (conn, screen_num) = RustConnection::connect(None)
            .map_err(|e| ResolverError::X11(format!("connect failed: {e}")))?;

        let root = conn.setup().roots[screen_num].root;

        let atoms = Atoms {
            net_client_list_stacking: intern(&conn, b"_NET_CLIENT_LIST_STACKING")?,
            net_wm_name: intern(&conn, b"_NET_WM_NAME")?,
            utf8_string: intern(&conn, b"UTF8_STRING")?,
            net_wm_state: intern(&conn, b"_NET_WM_STATE")?,
            net_wm_state_hidden: intern(&conn, b"_NET_WM_STATE_HIDDEN")?,
            net_wm_window_type: intern(&conn, b"_NET_WM_WINDOW_TYPE")?,
            net_wm_window_type_desktop: intern(&conn, b"_NET_WM_WINDOW_TYPE_DESKTOP")?,
        };

        tracing::info!(screen = screen_num, root, "connected to X11 display");

        Ok(Self { conn, root, atoms })
    }

    /// Read `_NET_CLIENT_LIST_STACKING` from the root window, bottommost
    /// first.
    pub fn stacking_list(&self) -> Result<Vec<Window>, ResolverError> {
        let reply = xproto::get_property(
            &self.conn,
            false,
            self.root,
            self.atoms.net_client_list_stacking,
            AtomEnum::WINDOW,
            0,
            MAX_PROPERTY_LEN,
        )
        .map_err(|e| ResolverError::X11(format!("get_property _NET_CLIENT_LIST_STACKING: {e}")))?
        .reply()
        .map_err(|e| ResolverError::X11(format!("get_property reply: {e}")))?;

        Ok(reply
            .value32()
            .map(|values| values.collect())
            .unwrap_or_default())
    }

    /// Describe one client window, or `None` if it is not something the
    /// user can be looking at (unmapped, minimized, untitled, desktop).
    ///
    /// Request errors are treated as "not visible": the window most likely
    /// closed while the snapshot was being taken.
    fn describe(&self, window: Window) -> Result<Option<WindowSnapshot>, ResolverError> {
        let attrs = match xproto::get_window_attributes(&self.conn, window)
            .map_err(|e| ResolverError::X11(format!("get_window_attributes: {e}")))?
            .reply()
        {
            Ok(attrs) => attrs,
            Err(e) => {
                tracing::debug!(window, error = %e, "window vanished during snapshot");
                return Ok(None);
            }
        };
        if attrs.map_state != MapState::VIEWABLE {
            return Ok(None);
        }

        let states = self.property32(window, self.atoms.net_wm_state, AtomEnum::ATOM.into())?;
        if states.contains(&self.atoms.net_wm_state_hidden) {
            return Ok(None);
        }

        let types = self.property32(window, self.atoms.net_wm_window_type, AtomEnum::ATOM.into())?;
        if types.contains(&self.atoms.net_wm_window_type_desktop) {
            return Ok(None);
        }

        let Some(title) = self.title(window)? else {
            return Ok(None);
        };

        let Some(rect) = self.root_rect(window)? else {
            return Ok(None);
        };

        Ok(Some(WindowSnapshot {
            handle: WindowHandle(window),
            title,
            rect,
        }))
    }

    /// `_NET_WM_NAME` (UTF-8), falling back to `WM_NAME`. Empty titles
    /// count as missing.
    fn title(&self, window: Window) -> Result<Option<String>, ResolverError> {
        let candidates = [
            (self.atoms.net_wm_name, self.atoms.utf8_string),
            (AtomEnum::WM_NAME.into(), AtomEnum::STRING.into()),
        ];

        for (property, type_) in candidates {
            let bytes = self.property8(window, property, type_)?;
            let title = String::from_utf8_lossy(&bytes).trim().to_string();
            if !title.is_empty() {
                return Ok(Some(title));
            }
        }
        Ok(None)
    }

    /// Window geometry translated to root coordinates.
    fn root_rect(&self, window: Window) -> Result<Option<Rect>, ResolverError> {
        let geometry = match xproto::get_geometry(&self.conn, window)
            .map_err(|e| ResolverError::X11(format!("get_geometry: {e}")))?
            .reply()
        {
            Ok(g) => g,
            Err(e) => {
                tracing::debug!(window, error = %e, "get_geometry failed");
                return Ok(None);
            }
        };

        let origin = match xproto::translate_coordinates(&self.conn, window, self.root, 0, 0)
            .map_err(|e| ResolverError::X11(format!("translate_coordinates: {e}")))?
            .reply()
        {
            Ok(t) => t,
            Err(e) => {
                tracing::debug!(window, error = %e, "translate_coordinates failed");
                return Ok(None);
            }
        };

        Ok(Some(Rect::new(
            i32::from(origin.dst_x),
            i32::from(origin.dst_y),
            i32::from(geometry.width),
            i32::from(geometry.height),
        )))
    }

    /// 32-bit property values. Missing property or a vanished window
    /// yields an empty list.
    fn property32(&self, window: Window, property: Atom, type_: Atom) -> Result<Vec<u32>, ResolverError> {
        let reply = xproto::get_property(&self.conn, false, window, property, type_, 0, MAX_PROPERTY_LEN)
            .map_err(|e| ResolverError::X11(format!("get_property: {e}")))?
            .reply();

        Ok(match reply {
            Ok(reply) => reply.value32().map(|v| v.collect()).unwrap_or_default(),
            Err(e) => {
                tracing::debug!(window, property, error = %e, "get_property failed");
                Vec::new()
            }
        })
    }

    /// 8-bit property bytes, same conventions as [`Self::property32`].
    fn property8(&self, window: Window, property: Atom, type_: Atom) -> Result<Vec<u8>, ResolverError> {
        let reply = xproto::get_property(&self.conn, false, window, property, type_, 0, MAX_PROPERTY_LEN)
            .map_err(|e| ResolverError::X11(format!("get_property: {e}")))?
            .reply();

        Ok(match reply {
            Ok(reply) => reply.value8().map(|v| v.collect()).unwrap_or_default(),
            Err(e) => {
                tracing::debug!(window, property, error = %e, "get_property failed");
                Vec::new()
            }
        })
    }
}

impl WindowSnapshotProvider for X11Display {
    fn snapshot(&self) -> Result<Vec<WindowSnapshot>, ResolverError> {
        let mut windows = Vec::new();
        for window in self.stacking_list()? {
            if let Some(snapshot) = self.describe(window)? {
                windows.push(snapshot);
            }
        }
        tracing::debug!(windows = windows.len(), "window snapshot");
        Ok(windows)
    }
}

impl ZOrderOracle for X11Display {
    /// Re-reads the stacking order for every query.
    fn is_above(&self, a: WindowHandle, b: WindowHandle) -> Result<bool, ResolverError> {
        let stacking = self
            .stacking_list()?
            .into_iter()
            .map(WindowHandle)
            .collect();
        StackingOrder::bottom_to_top(stacking).is_above(a, b)
    }
}

fn intern(conn: &RustConnection, name: &[u8]) -> Result<Atom, ResolverError> {
    Ok(xproto::intern_atom(conn, false, name)
        .map_err(|e| ResolverError::X11(format!("intern_atom: {e}")))?
        .reply()
        .map_err(|e| ResolverError::X11(format!("intern_atom reply: {e}")))?
        .atom)
}
