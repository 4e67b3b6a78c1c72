//! # chaant Agent
//!
//! The chess.com agent: page ownership, move resolution, the turn state
//! machine and collective (voted) play.
//!
//! ## Modules
//!
//! - [`registry`] - Exclusive page claims
//! - [`resolver`] - Notation to concrete squares against the live position
//! - [`agent`] - The agent state machine
//! - [`collective`] - Time-windowed vote aggregation over an agent
//! - [`site`] - The site's DOM contract (selectors, URLs, page scripts)

pub mod agent;
pub mod collective;
pub mod registry;
pub mod resolver;
pub mod site;

mod listeners;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use agent::ChesscomAgent;
pub use collective::{CollectiveMove, CollectiveSnapshot, VoteCount};
pub use registry::{PageLease, PageRegistry};
pub use resolver::resolve_move;
