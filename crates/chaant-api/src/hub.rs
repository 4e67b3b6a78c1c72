//! Live agents and the operations the control plane runs on them.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use chaant_agent::{ChesscomAgent, CollectiveMove, CollectiveSnapshot, PageRegistry};
use chaant_browser::{BotCatalog, Browser, BrowserError};
use chaant_config::Config;
use chaant_protocols::{
    AgentState, BotProfile, ChessAgent, ChessPage, Color, PlayState, TimeControl,
};

use crate::error::ApiError;

/// Source of fresh browser pages for new agents.
#[async_trait]
pub trait PageFactory: Send + Sync {
    async fn open_page(&self) -> Result<Arc<dyn ChessPage>, BrowserError>;
}

#[async_trait]
impl PageFactory for Browser {
    async fn open_page(&self) -> Result<Arc<dyn ChessPage>, BrowserError> {
        let page: Arc<dyn ChessPage> = Arc::new(self.open_chess_page().await?);
        Ok(page)
    }
}

/// Chess sites an agent can be created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Chesscom,
    Lichess,
}

impl FromStr for Platform {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chesscom" => Ok(Platform::Chesscom),
            "lichess" => Ok(Platform::Lichess),
            other => Err(ApiError::UnknownPlatform(other.to_string())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Chesscom => f.write_str("chesscom"),
            Platform::Lichess => f.write_str("lichess"),
        }
    }
}

/// Kind of opponent for a new game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Versus {
    Computer,
    Online,
}

impl FromStr for Versus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "computer" => Ok(Versus::Computer),
            "online" => Ok(Versus::Online),
            other => Err(ApiError::BadRequest(format!("Unknown opponent {}", other))),
        }
    }
}

/// How to start a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayRequest {
    Computer { bot: String, as_black: bool },
    Online(TimeControl),
}

/// One live agent with its vote aggregator.
pub struct AgentEntry {
    pub platform: Platform,
    pub agent: Arc<ChesscomAgent>,
    pub collective: CollectiveMove<ChesscomAgent>,
}

/// Externally visible view of an agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatus {
    pub agent_id: String,
    pub platform: Platform,
    pub state: AgentState,
    pub play_state: PlayState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    pub collective: CollectiveSnapshot,
}

/// Owns every live agent, keyed by a generated id.
pub struct AgentHub {
    config: Config,
    pages: Arc<dyn PageFactory>,
    catalog: Arc<BotCatalog>,
    registry: PageRegistry,
    agents: DashMap<Uuid, Arc<AgentEntry>>,
}

impl AgentHub {
    pub fn new(config: Config, pages: Arc<dyn PageFactory>, catalog: Arc<BotCatalog>) -> Self {
        Self {
            config,
            pages,
            catalog,
            registry: PageRegistry::new(),
            agents: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn catalog(&self) -> &BotCatalog {
        &self.catalog
    }

    /// Create an agent on a fresh page and return its id.
    pub async fn create(&self, platform: Platform) -> Result<Uuid, ApiError> {
        if platform != Platform::Chesscom {
            return Err(ApiError::UnsupportedPlatform(platform.to_string()));
        }

        let page = self.pages.open_page().await?;
        let agent = Arc::new(ChesscomAgent::attach(
            page,
            &self.registry,
            self.config.agent.clone(),
        )?);
        let collective = CollectiveMove::new(agent.clone(), self.config.collective.clone());

        let id = Uuid::new_v4();
        self.agents.insert(
            id,
            Arc::new(AgentEntry {
                platform,
                agent,
                collective,
            }),
        );
        info!("Created {} agent {}", platform, id);
        Ok(id)
    }

    pub fn get(&self, id: &Uuid) -> Result<Arc<AgentEntry>, ApiError> {
        self.agents
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ApiError::UnknownAgent(id.to_string()))
    }

    pub fn status(&self, id: &Uuid) -> Result<AgentStatus, ApiError> {
        let entry = self.get(id)?;
        Ok(AgentStatus {
            agent_id: id.to_string(),
            platform: entry.platform,
            state: entry.agent.status(),
            play_state: entry.agent.play_state(),
            color: entry.agent.color().ok(),
            collective: entry.collective.snapshot(),
        })
    }

    pub async fn play(&self, id: &Uuid, request: PlayRequest) -> Result<AgentState, ApiError> {
        let entry = self.get(id)?;
        let state = match request {
            PlayRequest::Computer { bot, as_black } => {
                let profile = self.find_bot(&bot).await?;
                entry.agent.play_computer(&profile, as_black).await?
            }
            PlayRequest::Online(time_control) => entry.agent.play_online(time_control).await?,
        };
        Ok(state)
    }

    async fn find_bot(&self, name: &str) -> Result<BotProfile, ApiError> {
        self.catalog
            .find(name)
            .await?
            .ok_or_else(|| ApiError::UnknownBot(name.to_string()))
    }

    /// Wait for the agent's turn, then play `notation`.
    pub async fn move_piece(&self, id: &Uuid, notation: &str) -> Result<AgentState, ApiError> {
        let entry = self.get(id)?;
        entry.agent.wait_turn().await?;
        Ok(entry.agent.move_piece(notation).await?)
    }

    pub async fn vote(&self, id: &Uuid, notation: &str) -> Result<bool, ApiError> {
        let entry = self.get(id)?;
        Ok(entry.collective.add_move(notation).await?)
    }

    pub async fn wait_turn(&self, id: &Uuid) -> Result<AgentState, ApiError> {
        let entry = self.get(id)?;
        Ok(entry.agent.wait_turn().await?)
    }

    /// Forget the agent and close its page.
    pub async fn dispose(&self, id: &Uuid) -> Result<(), ApiError> {
        let (_, entry) = self
            .agents
            .remove(id)
            .ok_or_else(|| ApiError::UnknownAgent(id.to_string()))?;
        entry.collective.reset();
        entry.agent.dispose().await?;
        info!("Disposed agent {}", id);
        Ok(())
    }

    /// Dispose every agent, logging failures.
    pub async fn shutdown(&self) {
        let ids: Vec<Uuid> = self.agents.iter().map(|e| *e.key()).collect();
        for id in ids {
            if let Err(e) = self.dispose(&id).await {
                warn!("Failed to dispose agent {}: {}", id, e);
            }
        }
    }
}

#[cfg(test)]
#[path = "hub_tests.rs"]
pub(crate) mod tests;
