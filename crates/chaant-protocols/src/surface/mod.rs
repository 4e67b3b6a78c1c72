//! Capabilities an agent consumes from its browser page.
//!
//! - [`BrowserSurface`]: generic automation primitives (navigation, element
//!   lookup, script evaluation, pointer dispatch)
//! - [`BoardCapability`]: typed queries against the page's in-memory game
//!
//! Every failure is a [`SurfaceError`](crate::error::SurfaceError). Adapters
//! never leak raw page objects past these traits.

mod board;
mod browser;

pub use board::*;
pub use browser::*;

/// A page that offers both the automation primitives and the board view.
///
/// This is what an agent owns.
pub trait ChessPage: BrowserSurface + BoardCapability {}

impl<T: BrowserSurface + BoardCapability + ?Sized> ChessPage for T {}
