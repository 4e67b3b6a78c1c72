//! Error types for the chaant protocol layer.

mod agent;
mod surface;

pub use agent::*;
pub use surface::*;
