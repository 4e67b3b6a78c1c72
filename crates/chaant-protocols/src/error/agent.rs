//! Agent errors.

use std::time::Duration;

use thiserror::Error;

use super::SurfaceError;
use crate::types::AgentState;

#[derive(Debug, Clone, Error)]
pub enum AgentError {
    #[error("Invalid chess notation: {0}")]
    InvalidNotation(String),

    #[error("No piece corresponds to the move {0}")]
    NoLegalMove(String),

    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),

    #[error("Promotion piece must be specified for {0}")]
    PromotionRequired(String),

    #[error("Agent is not playing")]
    NotPlaying,

    #[error("Agent piece color is not defined")]
    ColorUndefined,

    #[error("Another agent has already attached page {0}")]
    PageAlreadyAttached(String),

    #[error("Waiting for turn timed out after {0:?}")]
    WaitTimedOut(Duration),

    #[error("Agent making a move timed out: {0}")]
    MoveTimedOut(String),

    #[error("Agent lost contact with the browser page: {0}")]
    AgentUnreachable(#[from] SurfaceError),

    #[error("Agent is not detected to be playing")]
    IdleIllegalPlay,

    #[error("Agent could not take its turn (state: {0})")]
    TurnUnavailable(AgentState),
}

impl AgentError {
    /// Whether the caller may retry with corrected input.
    ///
    /// Legality errors leave the agent in its prior actionable state.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AgentError::InvalidNotation(_)
                | AgentError::NoLegalMove(_)
                | AgentError::AmbiguousMove(_)
                | AgentError::PromotionRequired(_)
        )
    }

    /// The state a failed play start publishes for this cause.
    pub fn play_start_state(&self) -> AgentState {
        match self {
            AgentError::IdleIllegalPlay => AgentState::IdleIllegalPlay,
            _ => AgentState::BrowserPageOutOfReach,
        }
    }
}

/// A failed agent operation paired with the state the agent published.
#[derive(Debug, Clone, Error)]
#[error("{cause} [state: {state}]")]
pub struct AgentFailure {
    pub cause: AgentError,
    pub state: AgentState,
}

impl AgentFailure {
    pub fn new(cause: AgentError, state: AgentState) -> Self {
        Self { cause, state }
    }

    /// Whether the agent behind this failure is dead and should be disposed.
    pub fn is_unreachable(&self) -> bool {
        matches!(self.cause, AgentError::AgentUnreachable(_))
            || self.state == AgentState::BrowserPageOutOfReach
    }
}

pub type AgentResult<T> = Result<T, AgentFailure>;
