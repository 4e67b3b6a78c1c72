//! # chaant API
//!
//! Control plane for chess agents. An [`AgentHub`] owns the live agents,
//! each paired with a collective vote aggregator, and the HTTP layer in
//! [`http`] exposes them:
//!
//! ```text
//! POST   /agents?platform=chesscom        create an agent on a fresh page
//! POST   /play?versus=computer&bot=martin start a game
//! POST   /move?move=e4                    wait for the turn, then move
//! POST   /move/collective?move=e4         cast a vote
//! POST   /wait                            wait for the turn
//! GET    /agents/status                   state, color and tally
//! DELETE /agents                          dispose
//! GET    /bots                            free site bots
//! GET    /health
//! ```
//!
//! Every agent-scoped route reads the agent id from the
//! `x-chaant-agent-id` header.

pub mod error;
pub mod http;
pub mod hub;
pub mod server;

pub use error::ApiError;
pub use http::routes::create_router;
pub use hub::{AgentEntry, AgentHub, PageFactory, Platform, PlayRequest, Versus};
pub use server::ApiServer;
