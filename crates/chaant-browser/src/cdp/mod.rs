//! Chrome DevTools Protocol (CDP) client.
//!
//! Connects to Chrome via WebSocket and speaks the CDP JSON-RPC protocol.
//! Start Chrome with `--remote-debugging-port=9222` or let
//! [`BrowserLauncher`](crate::BrowserLauncher) do it.

mod client;
mod error;
mod protocol;
mod session;

pub use client::CdpClient;
pub use error::CdpError;
pub use protocol::*;
pub use session::PageSession;
