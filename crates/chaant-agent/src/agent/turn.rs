//! Waiting on the page's ply count.

use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use chaant_protocols::{
    AgentError, AgentFailure, AgentResult, AgentState, BoardEvent, SurfaceError,
};

use super::AgentInner;

/// How a wait on the ply count ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum PlyWait {
    Reached(u32),
    GameOver,
    TimedOut,
}

impl AgentInner {
    /// Suspend until the page has played at least `target` plies.
    ///
    /// The subscription is taken before the first read so no event between
    /// the read and the wait is lost. Every settle interval the page is read
    /// directly in case an event was missed.
    pub(super) async fn wait_for_plies(
        &self,
        target: u32,
        window: Duration,
    ) -> Result<PlyWait, SurfaceError> {
        let mut events = self.page.subscribe().await?;
        if let Some(done) = self.read_plies(target).await? {
            return Ok(done);
        }

        let deadline = tokio::time::sleep(window);
        tokio::pin!(deadline);
        let settle_every = self.config.settle_interval();
        let mut settle = tokio::time::interval_at(Instant::now() + settle_every, settle_every);
        settle.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    debug!("No ply {} within {:?}", target, window);
                    return Ok(PlyWait::TimedOut);
                }
                _ = settle.tick() => {
                    if let Some(done) = self.read_plies(target).await? {
                        return Ok(done);
                    }
                }
                event = events.recv() => match event {
                    Ok(BoardEvent::Moved { plies }) if plies >= target => {
                        return Ok(PlyWait::Reached(plies));
                    }
                    Ok(BoardEvent::Moved { .. }) => {}
                    Ok(BoardEvent::GameOver) => {
                        return Ok(self.read_plies(target).await?.unwrap_or(PlyWait::GameOver));
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Board feed lagged by {} events", skipped);
                        if let Some(done) = self.read_plies(target).await? {
                            return Ok(done);
                        }
                    }
                    Err(RecvError::Closed) => return Err(SurfaceError::Closed),
                },
            }
        }
    }

    /// Read the page directly. A reached target wins over game over so the
    /// final move of a game still counts as played.
    async fn read_plies(&self, target: u32) -> Result<Option<PlyWait>, SurfaceError> {
        let plies = self.page.plies_played().await?;
        if plies >= target {
            return Ok(Some(PlyWait::Reached(plies)));
        }
        if self.page.is_game_over().await? {
            return Ok(Some(PlyWait::GameOver));
        }
        Ok(None)
    }

    pub(super) async fn wait_turn(&self) -> AgentResult<AgentState> {
        let (playing, counter) = {
            let shared = self.shared.read();
            (shared.play.is_playing(), shared.counter)
        };
        if !playing {
            return Err(AgentFailure::new(AgentError::NotPlaying, self.status()));
        }

        let window = self.config.turn_timeout();
        match self.wait_for_plies(counter, window).await {
            Ok(PlyWait::Reached(plies)) => {
                debug!("Turn reached at ply {}", plies);
                Ok(self.publish(AgentState::TakingTurn))
            }
            Ok(PlyWait::GameOver) => {
                self.end_game();
                Ok(AgentState::Idle)
            }
            Ok(PlyWait::TimedOut) => Err(self.fail_with(
                AgentError::WaitTimedOut(window),
                AgentState::BrowserPageOutOfReach,
            )),
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Make sure the agent holds the turn, waiting for it when needed.
    pub(super) async fn ensure_turn(&self) -> AgentResult<()> {
        if self.status() == AgentState::TakingTurn && self.play_state().is_playing() {
            return Ok(());
        }
        let state = self.wait_turn().await?;
        if state != AgentState::TakingTurn {
            return Err(AgentFailure::new(AgentError::TurnUnavailable(state), state));
        }
        Ok(())
    }
}
