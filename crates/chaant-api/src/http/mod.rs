//! HTTP interface.

pub mod handlers;
pub mod routes;

mod extract;

pub use extract::{AgentId, AGENT_ID_HEADER};
