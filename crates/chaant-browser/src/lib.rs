//! Chrome-backed implementation of the chaant page surface.
//!
//! [`BrowserLauncher`] starts or reuses Chrome with remote debugging,
//! [`Browser::open_chess_page`] opens a tab wrapped as a [`CdpChessPage`],
//! and [`BotCatalog`] lists the site's free computer opponents.

pub mod catalog;
pub mod cdp;
pub mod error;
pub mod launcher;
pub mod page;

pub use catalog::BotCatalog;
pub use error::BrowserError;
pub use launcher::{Browser, BrowserLauncher};
pub use page::CdpChessPage;
