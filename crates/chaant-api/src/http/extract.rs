use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::ApiError;

/// Header naming the agent a request targets.
pub const AGENT_ID_HEADER: &str = "x-chaant-agent-id";

/// Agent id taken from the [`AGENT_ID_HEADER`] header.
#[derive(Debug, Clone, Copy)]
pub struct AgentId(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for AgentId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(AGENT_ID_HEADER)
            .ok_or(ApiError::MissingAgentId)?;
        let text = raw.to_str().map_err(|_| ApiError::MissingAgentId)?;
        if text.trim().is_empty() {
            return Err(ApiError::MissingAgentId);
        }
        Uuid::parse_str(text.trim())
            .map(AgentId)
            .map_err(|_| ApiError::UnknownAgent(text.to_string()))
    }
}
