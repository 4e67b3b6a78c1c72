//! [`CdpChessPage`]: a chess.com tab driven over CDP.

mod scripts;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use chaant_protocols::{
    BoardCapability, BoardEvent, BoardGeometry, BoardSubscription, BrowserSurface, Color,
    ElementHandle, PageId, PieceKind, PieceOnBoard, PointerSequence, Square, SurfaceError,
};

use crate::cdp::{CdpEvent, PageSession};

pub use scripts::EVENT_BINDING;

const POLL: Duration = Duration::from_millis(100);
const BOARD_EVENT_BUFFER: usize = 64;

type BoardFeed = Arc<Mutex<Option<broadcast::Sender<BoardEvent>>>>;

/// One browser tab implementing [`ChessPage`](chaant_protocols::ChessPage).
pub struct CdpChessPage {
    id: PageId,
    session: Arc<PageSession>,
    board_events: BoardFeed,
    _pump: tokio::task::JoinHandle<()>,
}

impl CdpChessPage {
    /// Wrap `session`, installing the board event hook in current and future
    /// documents.
    pub async fn new(session: PageSession) -> Result<Self, SurfaceError> {
        let session = Arc::new(session);
        let hook = scripts::event_hook();
        session.add_binding(EVENT_BINDING).await?;
        session.add_init_script(&hook).await?;
        session.evaluate(&hook).await?;

        let (tx, _) = broadcast::channel(BOARD_EVENT_BUFFER);
        let board_events: BoardFeed = Arc::new(Mutex::new(Some(tx)));
        let cdp_events = session.events()?;
        let pump = tokio::spawn(pump_events(cdp_events, board_events.clone()));

        Ok(Self {
            id: PageId::new(session.target_id()),
            session,
            board_events,
            _pump: pump,
        })
    }

    async fn query<T: for<'de> Deserialize<'de>>(&self, script: &str) -> Result<T, SurfaceError> {
        let value = self.session.evaluate(script).await?;
        serde_json::from_value(value).map_err(|e| SurfaceError::InvalidData(e.to_string()))
    }

    /// Poll `script` until it yields a truthy value or `timeout` passes.
    async fn poll_truthy(&self, script: &str, timeout: Duration) -> Result<Value, SurfaceError> {
        let start = Instant::now();
        loop {
            match self.session.evaluate(script).await {
                Ok(value) if is_truthy(&value) => return Ok(value),
                Ok(_) => {}
                // Navigations tear down the execution context mid-poll.
                Err(crate::cdp::CdpError::JavaScript(e)) => trace!("Poll script threw: {}", e),
                Err(e) => return Err(e.into()),
            }
            if start.elapsed() >= timeout {
                return Err(SurfaceError::Timeout(format!("waiting {:?}", timeout)));
            }
            tokio::time::sleep(POLL).await;
        }
    }
}

impl Drop for CdpChessPage {
    fn drop(&mut self) {
        self._pump.abort();
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum HookEvent {
    Moved { plies: u32 },
    GameOver,
}

/// Translate binding calls into board events. The board feed closes when the
/// session's event stream ends.
async fn pump_events(mut events: broadcast::Receiver<CdpEvent>, feed: BoardFeed) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let Some(payload) = event.binding_payload(EVENT_BINDING) else {
                    continue;
                };
                let board_event = match serde_json::from_str::<HookEvent>(payload) {
                    Ok(HookEvent::Moved { plies }) => BoardEvent::Moved { plies },
                    Ok(HookEvent::GameOver) => BoardEvent::GameOver,
                    Err(e) => {
                        warn!("Unreadable board event {}: {}", payload, e);
                        continue;
                    }
                };
                trace!("Board event {:?}", board_event);
                if let Some(tx) = feed.lock().as_ref() {
                    let _ = tx.send(board_event);
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Dropped {} CDP events", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    debug!("CDP event stream ended");
    feed.lock().take();
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

#[derive(Debug, Deserialize)]
struct SitePiece {
    #[serde(rename = "type")]
    kind: String,
    color: i64,
    square: String,
}

impl SitePiece {
    fn into_piece(self) -> Option<PieceOnBoard> {
        Some(PieceOnBoard {
            kind: PieceKind::from_letter(self.kind.chars().next()?)?,
            color: scripts::color_from_site(self.color)?,
            square: Square::parse(&self.square).ok()?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiteGeometry {
    left: f64,
    top: f64,
    square_size: f64,
}

#[async_trait]
impl BrowserSurface for CdpChessPage {
    fn page_id(&self) -> PageId {
        self.id.clone()
    }

    async fn navigate(&self, url: &str) -> Result<(), SurfaceError> {
        Ok(self.session.navigate(url).await?)
    }

    async fn current_url(&self) -> Result<String, SurfaceError> {
        Ok(self.session.url().await?)
    }

    async fn find_one(&self, selector: &str) -> Result<Option<ElementHandle>, SurfaceError> {
        let found: usize = self.query(&scripts::count(selector)).await?;
        Ok((found > 0).then(|| ElementHandle::new(selector, 0)))
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>, SurfaceError> {
        let found: usize = self.query(&scripts::count(selector)).await?;
        Ok((0..found).map(|i| ElementHandle::new(selector, i)).collect())
    }

    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<ElementHandle, SurfaceError> {
        self.poll_truthy(&scripts::count(selector), timeout)
            .await
            .map_err(|e| match e {
                SurfaceError::Timeout(_) => SurfaceError::Timeout(format!("selector '{}'", selector)),
                other => other,
            })?;
        Ok(ElementHandle::new(selector, 0))
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), SurfaceError> {
        let clicked: bool = self
            .query(&scripts::click(&element.selector, element.index))
            .await?;
        if !clicked {
            return Err(SurfaceError::ElementNotFound(element.selector.clone()));
        }
        debug!("Clicked {}[{}]", element.selector, element.index);
        Ok(())
    }

    async fn element_text(&self, element: &ElementHandle) -> Result<String, SurfaceError> {
        let text: Option<String> = self
            .query(&scripts::text(&element.selector, element.index))
            .await?;
        text.ok_or_else(|| SurfaceError::ElementNotFound(element.selector.clone()))
    }

    async fn evaluate(&self, script: &str) -> Result<Value, SurfaceError> {
        Ok(self.session.evaluate(script).await?)
    }

    async fn wait_for_function(
        &self,
        script: &str,
        timeout: Duration,
    ) -> Result<Value, SurfaceError> {
        self.poll_truthy(script, timeout).await
    }

    async fn dispatch_pointer(&self, sequence: PointerSequence) -> Result<(), SurfaceError> {
        self.session
            .drag(
                (sequence.down.x, sequence.down.y),
                (sequence.up.x, sequence.up.y),
            )
            .await?;
        Ok(())
    }

    async fn reload(&self) -> Result<(), SurfaceError> {
        Ok(self.session.reload().await?)
    }

    async fn close(&self) -> Result<(), SurfaceError> {
        self.session.close().await?;
        self.board_events.lock().take();
        Ok(())
    }
}

#[async_trait]
impl BoardCapability for CdpChessPage {
    async fn playing_color(&self) -> Result<Option<Color>, SurfaceError> {
        let color: Option<i64> = self.query(&scripts::playing_color()).await?;
        Ok(color.and_then(scripts::color_from_site))
    }

    async fn plies_played(&self) -> Result<u32, SurfaceError> {
        self.query(&scripts::plies_played()).await
    }

    async fn pieces(&self, color: Color) -> Result<Vec<PieceOnBoard>, SurfaceError> {
        let pieces: Vec<SitePiece> = self.query(&scripts::pieces()).await?;
        Ok(pieces
            .into_iter()
            .filter_map(SitePiece::into_piece)
            .filter(|p| p.color == color)
            .collect())
    }

    async fn legal_moves_for_square(&self, square: Square) -> Result<Vec<Square>, SurfaceError> {
        let moves: Vec<String> = self.query(&scripts::legal_moves(square)).await?;
        Ok(moves.iter().filter_map(|m| Square::parse(m).ok()).collect())
    }

    async fn history_sans(&self) -> Result<Vec<String>, SurfaceError> {
        self.query(&scripts::history_sans()).await
    }

    async fn is_game_over(&self) -> Result<bool, SurfaceError> {
        self.query(&scripts::is_game_over()).await
    }

    async fn board_geometry(&self) -> Result<BoardGeometry, SurfaceError> {
        let g: SiteGeometry = self.query(&scripts::geometry()).await?;
        if g.square_size <= 0.0 {
            return Err(SurfaceError::InvalidData("board has no size".to_string()));
        }
        Ok(BoardGeometry {
            left: g.left,
            top: g.top,
            square_size: g.square_size,
        })
    }

    async fn subscribe(&self) -> Result<BoardSubscription, SurfaceError> {
        self.board_events
            .lock()
            .as_ref()
            .map(|tx| tx.subscribe())
            .ok_or(SurfaceError::Closed)
    }
}

#[cfg(test)]
#[path = "page_tests.rs"]
mod tests;
