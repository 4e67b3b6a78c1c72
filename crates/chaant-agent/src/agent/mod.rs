//! The chess.com agent state machine.
//!
//! One [`ChesscomAgent`] owns one page exclusively. All turn bookkeeping keys
//! off a single expected ply counter: the agent may move once the page has
//! played `counter` plies, and a move is confirmed once it has played
//! `counter + 1`.

mod moves;
mod play;
mod turn;
mod watcher;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use chaant_config::AgentConfig;
use chaant_protocols::{
    AgentError, AgentFailure, AgentResult, AgentState, BotProfile, ChessAgent, ChessPage, Color,
    EvaluatesMoveLegality, GameOverHandler, ListenerGuard, MoveListener, PageId, PlayState,
    ResolvedMove, TimeControl,
};

use crate::listeners::ListenerSet;
use crate::registry::{PageLease, PageRegistry};

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    state: AgentState,
    play: PlayState,
    color: Option<Color>,
    /// Plies the page must have played before it is this agent's turn.
    counter: u32,
}

pub(crate) struct AgentInner {
    page: Arc<dyn ChessPage>,
    page_id: PageId,
    config: AgentConfig,
    shared: RwLock<Snapshot>,
    listeners: ListenerSet,
    game_over: RwLock<Option<GameOverHandler>>,
    lease: Mutex<Option<PageLease>>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

/// Agent driving one chess.com page.
pub struct ChesscomAgent {
    inner: Arc<AgentInner>,
}

impl ChesscomAgent {
    /// Bind a new agent to `page`, claiming it in `registry`.
    pub fn attach(
        page: Arc<dyn ChessPage>,
        registry: &PageRegistry,
        config: AgentConfig,
    ) -> Result<Self, AgentError> {
        let page_id = page.page_id();
        let lease = registry.claim(&page_id)?;
        info!("Agent attached to page {}", page_id);

        Ok(Self {
            inner: Arc::new(AgentInner {
                page,
                page_id,
                config,
                shared: RwLock::new(Snapshot {
                    state: AgentState::Idle,
                    play: PlayState::NotPlaying,
                    color: None,
                    counter: 0,
                }),
                listeners: ListenerSet::default(),
                game_over: RwLock::new(None),
                lease: Mutex::new(Some(lease)),
                watcher: Mutex::new(None),
            }),
        })
    }

    pub fn page_id(&self) -> &PageId {
        &self.inner.page_id
    }

    /// Plies the page must reach before it is this agent's turn.
    pub fn move_counter(&self) -> u32 {
        self.inner.shared.read().counter
    }

    /// Play already resolved squares, bypassing notation.
    pub async fn move_by_square(&self, mv: ResolvedMove) -> AgentResult<AgentState> {
        self.inner.move_by_square(mv).await
    }
}

impl AgentInner {
    fn status(&self) -> AgentState {
        self.shared.read().state
    }

    fn play_state(&self) -> PlayState {
        self.shared.read().play
    }

    fn color(&self) -> Result<Color, AgentError> {
        self.shared.read().color.ok_or(AgentError::ColorUndefined)
    }

    fn publish(&self, state: AgentState) -> AgentState {
        let previous = std::mem::replace(&mut self.shared.write().state, state);
        if previous != state {
            if state.is_terminal() {
                error!("Agent on page {} is out of reach", self.page_id);
            } else {
                info!("Agent state {} -> {}", previous, state);
            }
        }
        state
    }

    /// Pair `cause` with the published state, escalating transport failures.
    fn fail(&self, cause: AgentError) -> AgentFailure {
        let state = match cause {
            AgentError::AgentUnreachable(_) => self.publish(AgentState::BrowserPageOutOfReach),
            _ => self.status(),
        };
        AgentFailure::new(cause, state)
    }

    fn fail_with(&self, cause: AgentError, state: AgentState) -> AgentFailure {
        AgentFailure::new(cause, self.publish(state))
    }

    /// The game ended: stop playing and tell whoever asked to know.
    fn end_game(&self) {
        let was_playing = {
            let mut shared = self.shared.write();
            let was = shared.play.is_playing();
            shared.play = PlayState::NotPlaying;
            shared.state = AgentState::Idle;
            was
        };
        if was_playing {
            info!("Game over on page {}", self.page_id);
            let handler = self.game_over.read().clone();
            if let Some(handler) = handler {
                handler();
            }
        }
    }

    fn stop_watcher(&self) {
        if let Some(handle) = self.watcher.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for AgentInner {
    fn drop(&mut self) {
        if let Some(handle) = self.watcher.get_mut().take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl ChessAgent for ChesscomAgent {
    fn status(&self) -> AgentState {
        self.inner.status()
    }

    fn play_state(&self) -> PlayState {
        self.inner.play_state()
    }

    fn color(&self) -> Result<Color, AgentError> {
        self.inner.color()
    }

    async fn play_computer(&self, bot: &BotProfile, as_black: bool) -> AgentResult<AgentState> {
        info!(
            "Starting game against {} ({}) as {}",
            bot.name,
            bot.elo,
            if as_black { "black" } else { "white" }
        );
        self.inner.stop_watcher();
        let started = self.inner.start_computer_game(bot, as_black).await;
        self.finish_play_start(started, PlayState::AgainstComputer)
    }

    async fn play_online(&self, time_control: TimeControl) -> AgentResult<AgentState> {
        info!("Starting {} online game", time_control);
        self.inner.stop_watcher();
        let started = self.inner.start_online_game(time_control).await;
        self.finish_play_start(started, PlayState::AgainstHuman)
    }

    async fn wait_turn(&self) -> AgentResult<AgentState> {
        self.inner.wait_turn().await
    }

    async fn move_piece(&self, notation: &str) -> AgentResult<AgentState> {
        self.inner.move_piece(notation).await
    }

    async fn last_move(&self) -> AgentResult<String> {
        let history = self
            .inner
            .page
            .history_sans()
            .await
            .map_err(|e| self.inner.fail(e.into()))?;
        Ok(history.last().map(|m| m.to_lowercase()).unwrap_or_default())
    }

    async fn agent_last_move(&self) -> AgentResult<String> {
        let color = self.inner.color().map_err(|e| self.inner.fail(e))?;
        let history = self
            .inner
            .page
            .history_sans()
            .await
            .map_err(|e| self.inner.fail(e.into()))?;
        Ok(last_ply_of(&history, color).unwrap_or_default())
    }

    fn on_move(&self, listener: MoveListener) -> ListenerGuard {
        self.inner.listeners.add(listener)
    }

    fn set_game_over_handler(&self, handler: GameOverHandler) {
        *self.inner.game_over.write() = Some(handler);
    }

    async fn dispose(&self) -> AgentResult<()> {
        self.inner.stop_watcher();
        if let Some(lease) = self.inner.lease.lock().take() {
            lease.release();
        }
        {
            let mut shared = self.inner.shared.write();
            shared.play = PlayState::NotPlaying;
            shared.color = None;
        }
        info!("Disposing agent on page {}", self.inner.page_id);
        self.inner.page.close().await.map_err(|e| {
            warn!("Closing page {} failed: {}", self.inner.page_id, e);
            self.inner.fail(e.into())
        })
    }
}

#[async_trait]
impl EvaluatesMoveLegality for ChesscomAgent {
    async fn evaluate_move(&self, notation: &str) -> AgentResult<ResolvedMove> {
        self.inner.evaluate_move(notation).await
    }
}

impl ChesscomAgent {
    fn finish_play_start(
        &self,
        started: Result<Color, AgentError>,
        mode: PlayState,
    ) -> AgentResult<AgentState> {
        let color = match started {
            Ok(color) => color,
            Err(cause) => {
                let state = cause.play_start_state();
                warn!("Game start failed: {}", cause);
                return Err(self.inner.fail_with(cause, state));
            }
        };

        let state = match color {
            Color::Black => AgentState::FirstWaitingTurn,
            Color::White => AgentState::TakingTurn,
        };
        {
            let mut shared = self.inner.shared.write();
            shared.color = Some(color);
            shared.counter = if color.is_black() { 1 } else { 0 };
            shared.play = mode;
        }
        self.inner.publish(state);
        watcher::spawn(&self.inner);
        info!("Playing {} as {}", mode, color);
        Ok(state)
    }
}

/// Most recent ply made by `color`, lowercased.
fn last_ply_of(history: &[String], color: Color) -> Option<String> {
    let mut last = history.len() as i64 - 1;
    let last_is_black = last % 2 == 1;
    if last >= 0 && last_is_black != color.is_black() {
        last -= 1;
    }
    usize::try_from(last)
        .ok()
        .and_then(|idx| history.get(idx))
        .map(|m| m.to_lowercase())
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
