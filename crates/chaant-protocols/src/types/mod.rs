//! Value types shared across chaant crates.

mod game;
mod piece;
mod square;
mod state;

pub use game::*;
pub use piece::*;
pub use square::*;
pub use state::*;
