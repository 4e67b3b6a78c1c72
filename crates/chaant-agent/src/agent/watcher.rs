//! Background game-over watcher.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use chaant_protocols::{AgentState, BoardEvent, ChessPage, SurfaceError};

use super::AgentInner;
use crate::site;

const RESUBSCRIBE_DELAY: Duration = Duration::from_millis(500);

/// Start watching for the end of the current game, replacing any previous
/// watcher. The task holds the agent weakly and ends with it.
pub(super) fn spawn(inner: &Arc<AgentInner>) {
    let agent = Arc::downgrade(inner);
    let page = inner.page.clone();
    let handle = tokio::spawn(watch(agent, page));
    if let Some(previous) = inner.watcher.lock().replace(handle) {
        previous.abort();
    }
}

async fn watch(agent: Weak<AgentInner>, page: Arc<dyn ChessPage>) {
    loop {
        let ended = wait_game_over(&*page).await;
        let Some(inner) = agent.upgrade() else {
            return;
        };
        match ended {
            Ok(()) => {
                inner.end_game();
                return;
            }
            Err(e) => {
                debug!("Game-over feed lost on page {}: {}", inner.page_id, e);
                if !inner.play_state().is_playing() {
                    return;
                }
                if inner.page_still_on_site().await {
                    drop(inner);
                    tokio::time::sleep(RESUBSCRIBE_DELAY).await;
                    continue;
                }
                warn!("Page {} left the site mid-game", inner.page_id);
                inner.publish(AgentState::BrowserPageOutOfReach);
                return;
            }
        }
    }
}

async fn wait_game_over(page: &dyn ChessPage) -> Result<(), SurfaceError> {
    let mut events = page.subscribe().await?;
    if page.is_game_over().await? {
        return Ok(());
    }
    loop {
        match events.recv().await {
            Ok(BoardEvent::GameOver) => return Ok(()),
            Ok(BoardEvent::Moved { .. }) => {}
            Err(RecvError::Lagged(_)) => {
                if page.is_game_over().await? {
                    return Ok(());
                }
            }
            Err(RecvError::Closed) => return Err(SurfaceError::Closed),
        }
    }
}

impl AgentInner {
    async fn page_still_on_site(&self) -> bool {
        let on_site = matches!(
            self.page.current_url().await,
            Ok(url) if url.contains(site::SITE_HOST)
        );
        on_site && matches!(self.page.find_one(site::BOARD).await, Ok(Some(_)))
    }
}
