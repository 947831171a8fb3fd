//! Window system adapters.

pub mod x11;

pub use self::x11::X11Display;
