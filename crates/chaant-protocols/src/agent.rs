//! Agent protocol definitions.
//!
//! [`ChessAgent`] is the state machine surface control planes drive.
//! [`EvaluatesMoveLegality`] exposes move resolution on its own so that
//! collective play can validate votes without submitting them.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, AgentResult};
use crate::types::{AgentState, BotProfile, Color, PlayState, ResolvedMove, TimeControl};

/// A confirmed move made by the agent itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Notation as submitted.
    pub notation: String,
    pub resolved: ResolvedMove,
    /// Plies the page reported when the move was confirmed.
    pub plies: u32,
}

/// Callback invoked after each confirmed own move.
///
/// Listeners run synchronously on the moving task; errors are logged by the
/// agent and never fail the move.
pub type MoveListener = Arc<dyn Fn(&MoveRecord) -> Result<(), AgentError> + Send + Sync>;

/// Callback invoked once when a game ends.
pub type GameOverHandler = Arc<dyn Fn() + Send + Sync>;

/// Unregisters a listener when dropped.
#[must_use = "dropping the guard unregisters the listener"]
pub struct ListenerGuard {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl ListenerGuard {
    pub fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A guard that releases nothing.
    pub fn noop() -> Self {
        Self { release: None }
    }

    /// Unregister now.
    pub fn release(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("armed", &self.release.is_some())
            .finish()
    }
}

/// Core trait for chess agents.
#[async_trait]
pub trait ChessAgent: Send + Sync {
    /// Current published state.
    fn status(&self) -> AgentState;

    fn play_state(&self) -> PlayState;

    /// Assigned color. Fails with `ColorUndefined` before any game started.
    fn color(&self) -> Result<Color, AgentError>;

    /// `"black"` or `"white"`.
    fn black_or_white(&self) -> Result<&'static str, AgentError> {
        self.color().map(|c| c.as_str())
    }

    /// Start a game against a site bot.
    async fn play_computer(&self, bot: &BotProfile, as_black: bool) -> AgentResult<AgentState>;

    /// Start an online game with the given time-control preset.
    async fn play_online(&self, time_control: TimeControl) -> AgentResult<AgentState>;

    async fn play_rapid(&self) -> AgentResult<AgentState> {
        self.play_online(TimeControl::Rapid).await
    }

    async fn play_blitz(&self) -> AgentResult<AgentState> {
        self.play_online(TimeControl::Blitz).await
    }

    async fn play_bullet(&self) -> AgentResult<AgentState> {
        self.play_online(TimeControl::Bullet).await
    }

    async fn play_classical(&self) -> AgentResult<AgentState> {
        self.play_online(TimeControl::Classical).await
    }

    /// Suspend until it is this agent's turn or the game ends.
    async fn wait_turn(&self) -> AgentResult<AgentState>;

    /// Resolve `notation` and play it on the page.
    async fn move_piece(&self, notation: &str) -> AgentResult<AgentState>;

    /// Latest ply of either side, lowercased; empty when none.
    async fn last_move(&self) -> AgentResult<String>;

    /// Latest ply of this agent's color, lowercased; empty when none.
    async fn agent_last_move(&self) -> AgentResult<String>;

    fn on_move(&self, listener: MoveListener) -> ListenerGuard;

    fn set_game_over_handler(&self, handler: GameOverHandler);

    /// Release the page claim and close the page. Call at most once.
    async fn dispose(&self) -> AgentResult<()>;
}

/// Move resolution without submission.
#[async_trait]
pub trait EvaluatesMoveLegality: Send + Sync {
    async fn evaluate_move(&self, notation: &str) -> AgentResult<ResolvedMove>;
}

/// Agents eligible for collective play.
pub trait CollectiveAgent: ChessAgent + EvaluatesMoveLegality {}

impl<T: ChessAgent + EvaluatesMoveLegality + ?Sized> CollectiveAgent for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_listener_guard_releases_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let guard = ListenerGuard::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(released.load(Ordering::SeqCst), 0);
        drop(guard);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_guard_release_runs_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let guard = ListenerGuard::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        guard.release();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_noop_guard() {
        let guard = ListenerGuard::noop();
        assert!(format!("{:?}", guard).contains("false"));
    }
}
