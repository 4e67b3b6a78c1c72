//! Agent and play states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Externally observable status of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    /// No game, or the game just ended.
    Idle,
    /// Game started as black, before the first turn wait.
    FirstWaitingTurn,
    TakingTurn,
    MovedWaitingTurn,
    /// The last move submission was not confirmed by the page.
    MovedIllegal,
    /// An active game was expected but could not be confirmed.
    IdleIllegalPlay,
    /// The page can no longer be driven; dispose the agent.
    BrowserPageOutOfReach,
}

impl AgentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentState::Idle => "Idle",
            AgentState::FirstWaitingTurn => "FirstWaitingTurn",
            AgentState::TakingTurn => "TakingTurn",
            AgentState::MovedWaitingTurn => "MovedWaitingTurn",
            AgentState::MovedIllegal => "MovedIllegal",
            AgentState::IdleIllegalPlay => "IdleIllegalPlay",
            AgentState::BrowserPageOutOfReach => "BrowserPageOutOfReach",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentState::BrowserPageOutOfReach)
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a game session is active, independent of per-move state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlayState {
    #[default]
    NotPlaying,
    AgainstComputer,
    AgainstHuman,
}

impl PlayState {
    pub fn is_playing(&self) -> bool {
        !matches!(self, PlayState::NotPlaying)
    }
}

impl fmt::Display for PlayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlayState::NotPlaying => "NotPlaying",
            PlayState::AgainstComputer => "AgainstComputer",
            PlayState::AgainstHuman => "AgainstHuman",
        };
        f.write_str(name)
    }
}
