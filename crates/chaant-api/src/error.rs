//! API error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use chaant_browser::BrowserError;
use chaant_protocols::{AgentError, AgentFailure, AgentState};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Agent Id is not defined")]
    MissingAgentId,

    #[error("Agent is not found: {0}")]
    UnknownAgent(String),

    #[error("Unknown platform {0}")]
    UnknownPlatform(String),

    #[error("Platform {0} is not supported")]
    UnsupportedPlatform(String),

    #[error("Bot is not found: {0}")]
    UnknownBot(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Agent(#[from] AgentFailure),

    #[error("Agent could not be created: {0}")]
    Attach(#[from] AgentError),

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<AgentState>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::UnknownAgent(_) | ApiError::UnknownBot(_) => StatusCode::NOT_FOUND,
            ApiError::Agent(failure) if failure.is_unreachable() => StatusCode::GONE,
            ApiError::Agent(failure) if failure.cause.is_recoverable() => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Agent(_) | ApiError::Attach(_) => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Agent state to report alongside the error, if an agent produced it.
    pub fn state(&self) -> Option<AgentState> {
        match self {
            ApiError::Agent(failure) => Some(failure.state),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            state: self.state(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
