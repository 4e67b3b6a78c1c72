//! Submitting moves through pointer input.

use rand::Rng;
use tracing::{debug, info, warn};

use chaant_protocols::{
    parse_notation, AgentError, AgentFailure, AgentResult, AgentState, Color, MoveRecord,
    PointerSequence, ResolvedMove, SurfaceError,
};

use super::turn::PlyWait;
use super::AgentInner;
use crate::resolver::resolve_move;
use crate::site;

/// Outcome of one physical attempt at a move.
enum Attempt {
    Confirmed(u32),
    Unconfirmed,
    GameOver,
}

impl AgentInner {
    pub(super) async fn evaluate_move(&self, notation: &str) -> AgentResult<ResolvedMove> {
        let parsed = parse_notation(notation).map_err(|e| self.fail(e))?;
        self.ensure_turn().await?;
        let color = self.color().map_err(|e| self.fail(e))?;
        resolve_move(&*self.page, color, &parsed, notation)
            .await
            .map_err(|e| self.fail(e))
    }

    pub(super) async fn move_piece(&self, notation: &str) -> AgentResult<AgentState> {
        let mv = self.evaluate_move(notation).await?;
        self.submit(notation, mv).await
    }

    pub(super) async fn move_by_square(&self, mv: ResolvedMove) -> AgentResult<AgentState> {
        self.ensure_turn().await?;
        self.submit(&mv.uci(), mv).await
    }

    /// Play `mv` on the page and wait for the page to confirm it.
    async fn submit(&self, notation: &str, mv: ResolvedMove) -> AgentResult<AgentState> {
        let color = self.color().map_err(|e| self.fail(e))?;
        let counter = self.shared.read().counter;
        let attempts = self.config.reload_retries + 1;

        for attempt in 1..=attempts {
            let outcome = self
                .attempt_move(color, counter, &mv)
                .await
                .map_err(|e| self.fail(e.into()))?;
            match outcome {
                Attempt::Confirmed(plies) => return Ok(self.confirm(notation, mv, plies)),
                Attempt::GameOver => {
                    self.end_game();
                    return Err(AgentFailure::new(AgentError::NotPlaying, AgentState::Idle));
                }
                Attempt::Unconfirmed if attempt < attempts => {
                    warn!("Move {} unconfirmed, reloading page (attempt {})", mv, attempt);
                    self.page.reload().await.map_err(|e| self.fail(e.into()))?;
                    if !self.board_restored().await? {
                        break;
                    }
                }
                Attempt::Unconfirmed => {}
            }
        }

        warn!("Move {} was never confirmed by the page", mv);
        Err(self.fail_with(
            AgentError::MoveTimedOut(mv.uci()),
            AgentState::MovedIllegal,
        ))
    }

    /// Wait for the board to come back after a reload. `false` when it
    /// never did within the UI timeout.
    async fn board_restored(&self) -> AgentResult<bool> {
        match self
            .page
            .wait_for_function(site::BOARD_READY, self.config.ui_timeout())
            .await
        {
            Ok(_) => Ok(true),
            Err(SurfaceError::Timeout(_)) => {
                warn!("Board did not come back after reload");
                Ok(false)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    async fn attempt_move(
        &self,
        color: Color,
        counter: u32,
        mv: &ResolvedMove,
    ) -> Result<Attempt, SurfaceError> {
        let geometry = self.page.board_geometry().await?;
        let sequence = {
            let mut rng = rand::thread_rng();
            PointerSequence {
                down: geometry.point_in(
                    mv.from,
                    color,
                    rng.gen_range(0.1..=0.9),
                    rng.gen_range(0.1..=0.9),
                ),
                up: geometry.point_in(
                    mv.to,
                    color,
                    rng.gen_range(0.1..=0.9),
                    rng.gen_range(0.1..=0.9),
                ),
            }
        };
        debug!("Dragging {} -> {}", mv.from, mv.to);
        self.page.dispatch_pointer(sequence).await?;

        if let Some(piece) = mv.promote_to {
            let selector = site::promotion_piece(color, piece);
            match self.page.wait_for(&selector, self.config.ui_timeout()).await {
                Ok(tile) => self.page.click(&tile).await?,
                Err(SurfaceError::Timeout(_)) => {
                    debug!("Promotion picker did not appear for {}", mv);
                    return Ok(Attempt::Unconfirmed);
                }
                Err(e) => return Err(e),
            }
        }

        let window = self
            .config
            .confirm_timeout(mv.promote_to.is_some())
            .min(self.config.turn_timeout());
        Ok(match self.wait_for_plies(counter + 1, window).await? {
            PlyWait::Reached(plies) => Attempt::Confirmed(plies),
            PlyWait::GameOver => Attempt::GameOver,
            PlyWait::TimedOut => Attempt::Unconfirmed,
        })
    }

    fn confirm(&self, notation: &str, mv: ResolvedMove, plies: u32) -> AgentState {
        let still_playing = {
            let mut shared = self.shared.write();
            shared.counter += 2;
            shared.play.is_playing()
        };
        let state = if still_playing {
            self.publish(AgentState::MovedWaitingTurn)
        } else {
            self.status()
        };
        info!("Played {} ({}) at ply {}", notation, mv, plies);

        self.listeners.notify(&MoveRecord {
            notation: notation.to_string(),
            resolved: mv,
            plies,
        });
        state
    }
}
