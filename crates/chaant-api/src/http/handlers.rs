//! Agent API handlers.
//!
//! Query parameters are all optional at the extractor level and validated
//! here so that every rejection carries the JSON error body.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use chaant_agent::CollectiveSnapshot;
use chaant_protocols::{AgentState, BotProfile, TimeControl};

use super::AgentId;
use crate::error::ApiError;
use crate::hub::{AgentHub, AgentStatus, Platform, PlayRequest, Versus};

#[derive(Debug, Deserialize)]
pub struct NewAgentQuery {
    pub platform: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewAgentResponse {
    pub agent_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PlayQuery {
    pub versus: Option<String>,
    pub bot: Option<String>,
    #[serde(rename = "as")]
    pub side: Option<String>,
    pub time: Option<String>,
}

impl PlayQuery {
    pub fn into_request(self) -> Result<PlayRequest, ApiError> {
        let versus: Versus = self
            .versus
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("Opponent is not specified".to_string()))?
            .parse()?;

        match versus {
            Versus::Computer => {
                let bot = self
                    .bot
                    .filter(|b| !b.trim().is_empty())
                    .ok_or_else(|| ApiError::BadRequest("Bot is not specified".to_string()))?;
                let as_black = match self.side.as_deref().map(str::trim) {
                    None | Some("white") => false,
                    Some("black") => true,
                    Some(other) => {
                        return Err(ApiError::BadRequest(format!("Unknown side {}", other)));
                    }
                };
                Ok(PlayRequest::Computer { bot, as_black })
            }
            Versus::Online => {
                let time_control = match self.time.as_deref() {
                    None => TimeControl::Rapid,
                    Some(raw) => raw.parse().map_err(ApiError::BadRequest)?,
                };
                Ok(PlayRequest::Online(time_control))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MoveQuery {
    #[serde(rename = "move")]
    pub notation: Option<String>,
}

impl MoveQuery {
    fn notation(self) -> Result<String, ApiError> {
        self.notation
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("Move is not specified".to_string()))
    }
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub state: AgentState,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub accepted: bool,
    pub tally: CollectiveSnapshot,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub agents: usize,
}

/// POST /agents
pub async fn create_agent(
    State(hub): State<Arc<AgentHub>>,
    Query(query): Query<NewAgentQuery>,
) -> Result<Json<NewAgentResponse>, ApiError> {
    let platform: Platform = query
        .platform
        .as_deref()
        .ok_or_else(|| ApiError::UnknownPlatform(String::new()))?
        .parse()?;
    let id = hub.create(platform).await?;
    Ok(Json(NewAgentResponse {
        agent_id: id.to_string(),
    }))
}

/// POST /play
pub async fn play(
    State(hub): State<Arc<AgentHub>>,
    AgentId(id): AgentId,
    Query(query): Query<PlayQuery>,
) -> Result<Json<StateResponse>, ApiError> {
    let request = query.into_request()?;
    info!("Agent {} play request: {:?}", id, request);
    let state = hub.play(&id, request).await?;
    Ok(Json(StateResponse { state }))
}

/// POST /move
pub async fn move_piece(
    State(hub): State<Arc<AgentHub>>,
    AgentId(id): AgentId,
    Query(query): Query<MoveQuery>,
) -> Result<Json<StateResponse>, ApiError> {
    let notation = query.notation()?;
    let state = hub.move_piece(&id, &notation).await?;
    Ok(Json(StateResponse { state }))
}

/// POST /move/collective
pub async fn vote(
    State(hub): State<Arc<AgentHub>>,
    AgentId(id): AgentId,
    Query(query): Query<MoveQuery>,
) -> Result<Json<VoteResponse>, ApiError> {
    let notation = query.notation()?;
    let accepted = hub.vote(&id, &notation).await?;
    let tally = hub.get(&id)?.collective.snapshot();
    Ok(Json(VoteResponse { accepted, tally }))
}

/// POST /wait
pub async fn wait_turn(
    State(hub): State<Arc<AgentHub>>,
    AgentId(id): AgentId,
) -> Result<Json<StateResponse>, ApiError> {
    let state = hub.wait_turn(&id).await?;
    Ok(Json(StateResponse { state }))
}

/// GET /agents/status
pub async fn agent_status(
    State(hub): State<Arc<AgentHub>>,
    AgentId(id): AgentId,
) -> Result<Json<AgentStatus>, ApiError> {
    Ok(Json(hub.status(&id)?))
}

/// DELETE /agents
pub async fn dispose_agent(
    State(hub): State<Arc<AgentHub>>,
    AgentId(id): AgentId,
) -> Result<impl IntoResponse, ApiError> {
    hub.dispose(&id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// GET /bots
pub async fn list_bots(State(hub): State<Arc<AgentHub>>) -> Result<Json<Vec<BotProfile>>, ApiError> {
    Ok(Json(hub.catalog().bots().await?.to_vec()))
}

/// GET /health
pub async fn health(State(hub): State<Arc<AgentHub>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        agents: hub.len(),
    })
}
