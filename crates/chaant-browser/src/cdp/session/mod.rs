//! CDP page session, split by concern.

mod core;
mod input;
mod navigation;
mod runtime;

pub use self::core::PageSession;
