//! HTTP route definitions.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::hub::AgentHub;

/// Build the control plane router.
///
/// ```text
/// /agents
///   POST   /agents           - Create an agent (?platform=chesscom)
///   DELETE /agents           - Dispose the agent
///   GET    /agents/status    - Agent state, color and vote tally
///
/// POST   /play               - Start a game (?versus=computer|online&bot=&as=&time=)
/// POST   /move               - Wait for the turn, then move (?move=)
/// POST   /move/collective    - Cast a vote (?move=)
/// POST   /wait               - Wait for the turn
///
/// GET    /bots               - Free computer opponents
/// GET    /health             - Health check
/// ```
pub fn create_router(hub: Arc<AgentHub>) -> Router {
    Router::new()
        .route(
            "/agents",
            post(handlers::create_agent).delete(handlers::dispose_agent),
        )
        .route("/agents/status", get(handlers::agent_status))
        .route("/play", post(handlers::play))
        .route("/move", post(handlers::move_piece))
        .route("/move/collective", post(handlers::vote))
        .route("/wait", post(handlers::wait_turn))
        .route("/bots", get(handlers::list_bots))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(hub)
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
