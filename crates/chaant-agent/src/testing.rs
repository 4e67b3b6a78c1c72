//! Scripted in-memory page.
//!
//! Implements [`ChessPage`](chaant_protocols::ChessPage) over a small model
//! of the site: a piece list, a legal-move table the test controls, a SAN
//! history and a broadcast channel for board events. Drags are located
//! through the board geometry exactly as the real page would see them.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use chaant_protocols::{
    BoardCapability, BoardEvent, BoardGeometry, BoardSubscription, BrowserSurface, Color,
    ElementHandle, PageId, PieceKind, PieceOnBoard, PointerSequence, Square, SurfaceError,
};

use crate::site;

pub const SQUARE_SIZE: f64 = 100.0;

#[derive(Default)]
struct PageState {
    url: String,
    playing_as: Option<Color>,
    game_over: bool,
    game_active: Option<bool>,
    guest: bool,
    pieces: Vec<PieceOnBoard>,
    legal: HashMap<Square, Vec<Square>>,
    history: Vec<String>,
    missing: HashSet<String>,
    clicks: Vec<String>,
    drags: Vec<(Square, Square)>,
    ignored_drags: u32,
    pending_promotion: Option<(Square, Square)>,
    replies: VecDeque<String>,
    reply_delay: Duration,
    reloads: u32,
    board_hidden_on_reload: Duration,
    board_back_at: Option<tokio::time::Instant>,
    closed: bool,
    unreachable: bool,
}

pub struct ScriptedPage {
    id: PageId,
    me: Weak<ScriptedPage>,
    state: Mutex<PageState>,
    events: broadcast::Sender<BoardEvent>,
    calls: AtomicUsize,
}

pub fn sq(notation: &str) -> Square {
    Square::parse(notation).expect("test square")
}

pub fn piece(kind: PieceKind, color: Color, square: &str) -> PieceOnBoard {
    PieceOnBoard {
        kind,
        color,
        square: sq(square),
    }
}

impl ScriptedPage {
    /// Empty board, no game.
    pub fn new(id: &str) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new_cyclic(|me| Self {
            id: PageId::new(id),
            me: me.clone(),
            state: Mutex::new(PageState {
                url: "about:blank".to_string(),
                ..Default::default()
            }),
            events,
            calls: AtomicUsize::new(0),
        })
    }

    /// Starting position with every opening move legal for both sides.
    pub fn opening(id: &str) -> Arc<Self> {
        let page = Self::new(id);
        {
            let mut state = page.state.lock();
            let back = [
                PieceKind::Rook,
                PieceKind::Knight,
                PieceKind::Bishop,
                PieceKind::Queen,
                PieceKind::King,
                PieceKind::Bishop,
                PieceKind::Knight,
                PieceKind::Rook,
            ];
            for (file, kind) in back.iter().enumerate() {
                let file = file as u8;
                for (color, back_rank, pawn_rank, dir) in
                    [(Color::White, 0u8, 1u8, 1i8), (Color::Black, 7, 6, -1)]
                {
                    let home = Square::new(file, back_rank).expect("board square");
                    let pawn = Square::new(file, pawn_rank).expect("board square");
                    state.pieces.push(PieceOnBoard {
                        kind: *kind,
                        color,
                        square: home,
                    });
                    state.pieces.push(PieceOnBoard {
                        kind: PieceKind::Pawn,
                        color,
                        square: pawn,
                    });
                    let one = Square::new(file, (pawn_rank as i8 + dir) as u8).expect("square");
                    let two = Square::new(file, (pawn_rank as i8 + 2 * dir) as u8).expect("square");
                    state.legal.insert(pawn, vec![one, two]);
                }
            }
            state.legal.insert(sq("b1"), vec![sq("a3"), sq("c3")]);
            state.legal.insert(sq("g1"), vec![sq("f3"), sq("h3")]);
            state.legal.insert(sq("b8"), vec![sq("a6"), sq("c6")]);
            state.legal.insert(sq("g8"), vec![sq("f6"), sq("h6")]);
        }
        page
    }

    pub fn set_playing_as(&self, color: Option<Color>) {
        self.state.lock().playing_as = color;
    }

    /// Override what the page reports for "is a game running".
    pub fn set_game_active(&self, active: bool) {
        self.state.lock().game_active = Some(active);
    }

    pub fn set_guest(&self, guest: bool) {
        self.state.lock().guest = guest;
    }

    pub fn set_pieces(&self, pieces: Vec<PieceOnBoard>) {
        self.state.lock().pieces = pieces;
    }

    pub fn set_legal(&self, from: &str, to: &[&str]) {
        self.state
            .lock()
            .legal
            .insert(sq(from), to.iter().map(|s| sq(s)).collect());
    }

    /// Make `selector` (or page script) absent from the page.
    pub fn set_missing(&self, selector: &str) {
        self.state.lock().missing.insert(selector.to_string());
    }

    /// Every later call fails as if the browser connection dropped.
    pub fn set_unreachable(&self) {
        self.state.lock().unreachable = true;
    }

    /// Swallow the next `count` drags without applying them.
    pub fn ignore_drags(&self, count: u32) {
        self.state.lock().ignored_drags = count;
    }

    /// Opponent replies, played `delay` after each accepted agent move.
    pub fn queue_replies(&self, replies: &[&str], delay: Duration) {
        let mut state = self.state.lock();
        state.replies.extend(replies.iter().map(|s| s.to_string()));
        state.reply_delay = delay;
    }

    /// Record an opponent ply and emit the move event.
    pub fn opponent_move(&self, san: &str) {
        let plies = {
            let mut state = self.state.lock();
            state.history.push(san.to_string());
            state.history.len() as u32
        };
        let _ = self.events.send(BoardEvent::Moved { plies });
    }

    pub fn end_game(&self) {
        {
            let mut state = self.state.lock();
            state.game_over = true;
            state.playing_as = None;
        }
        let _ = self.events.send(BoardEvent::GameOver);
    }

    /// After each reload the board stays unbuilt for `delay`.
    pub fn hide_board_on_reload(&self, delay: Duration) {
        self.state.lock().board_hidden_on_reload = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn drags(&self) -> Vec<(Square, Square)> {
        self.state.lock().drags.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().clicks.clone()
    }

    pub fn reloads(&self) -> u32 {
        self.state.lock().reloads
    }

    pub fn history(&self) -> Vec<String> {
        self.state.lock().history.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn url(&self) -> String {
        self.state.lock().url.clone()
    }

    fn touch(&self) -> Result<(), SurfaceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock();
        if state.closed {
            return Err(SurfaceError::Closed);
        }
        if state.unreachable {
            return Err(SurfaceError::Transport("connection reset".to_string()));
        }
        Ok(())
    }

    fn board_ready(&self) -> bool {
        self.state
            .lock()
            .board_back_at
            .map_or(true, |at| tokio::time::Instant::now() >= at)
    }

    fn geometry() -> BoardGeometry {
        BoardGeometry {
            left: 0.0,
            top: 0.0,
            square_size: SQUARE_SIZE,
        }
    }

    fn apply(&self, from: Square, to: Square, promote_to: Option<PieceKind>) {
        let (plies, reply, delay) = {
            let mut state = self.state.lock();
            if !state.pieces.iter().any(|p| p.square == from) {
                return;
            }
            state.pieces.retain(|p| p.square != to);
            let Some(idx) = state.pieces.iter().position(|p| p.square == from) else {
                return;
            };
            let moving = state.pieces[idx];
            state.pieces[idx].square = to;
            if let Some(kind) = promote_to {
                state.pieces[idx].kind = kind;
            }
            state.legal.remove(&from);

            let mut san = match moving.kind {
                PieceKind::Pawn if from.file() != to.file() => {
                    format!("{}x{}", from.file_notation(), to)
                }
                PieceKind::Pawn => to.to_string(),
                kind => format!("{}{}", kind.letter().to_ascii_uppercase(), to),
            };
            if let Some(kind) = promote_to {
                san.push('=');
                san.push(kind.letter().to_ascii_uppercase());
            }
            state.history.push(san);
            let reply = state.replies.pop_front();
            (state.history.len() as u32, reply, state.reply_delay)
        };
        let _ = self.events.send(BoardEvent::Moved { plies });

        if let Some(reply) = reply {
            let me = self.me.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Some(page) = me.upgrade() {
                    page.opponent_move(&reply);
                }
            });
        }
    }
}

#[async_trait]
impl BrowserSurface for ScriptedPage {
    fn page_id(&self) -> PageId {
        self.id.clone()
    }

    async fn navigate(&self, url: &str) -> Result<(), SurfaceError> {
        self.touch()?;
        self.state.lock().url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String, SurfaceError> {
        self.touch()?;
        Ok(self.state.lock().url.clone())
    }

    async fn find_one(&self, selector: &str) -> Result<Option<ElementHandle>, SurfaceError> {
        self.touch()?;
        let state = self.state.lock();
        if state.missing.contains(selector) || (selector == site::LOGIN_LINK && !state.guest) {
            return Ok(None);
        }
        Ok(Some(ElementHandle::new(selector, 0)))
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>, SurfaceError> {
        Ok(self.find_one(selector).await?.into_iter().collect())
    }

    async fn wait_for(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<ElementHandle, SurfaceError> {
        self.find_one(selector)
            .await?
            .ok_or_else(|| SurfaceError::Timeout(format!("selector '{}'", selector)))
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), SurfaceError> {
        self.touch()?;
        let pending = {
            let mut state = self.state.lock();
            state.clicks.push(element.selector.clone());
            if element.selector.contains("promotion") {
                state.pending_promotion.take()
            } else {
                None
            }
        };
        if let Some((from, to)) = pending {
            let promote = element
                .selector
                .chars()
                .last()
                .and_then(PieceKind::from_letter);
            self.apply(from, to, promote);
        }
        Ok(())
    }

    async fn element_text(&self, _element: &ElementHandle) -> Result<String, SurfaceError> {
        self.touch()?;
        Ok(String::new())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, SurfaceError> {
        self.touch()?;
        let state = self.state.lock();
        if script == site::GAME_ACTIVE {
            let active = state
                .game_active
                .unwrap_or(state.playing_as.is_some() && !state.game_over);
            return Ok(json!(active));
        }
        if script.contains("querySelectorAll('button')") {
            let found = !state.missing.iter().any(|m| script.contains(m.as_str()));
            return Ok(json!(if found { 0 } else { -1 }));
        }
        Ok(Value::Null)
    }

    async fn wait_for_function(
        &self,
        script: &str,
        timeout: Duration,
    ) -> Result<Value, SurfaceError> {
        self.touch()?;
        if script == site::BOARD_READY {
            let deadline = tokio::time::Instant::now() + timeout;
            while !self.board_ready() {
                if tokio::time::Instant::now() >= deadline {
                    return Err(SurfaceError::Timeout("board".to_string()));
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            return Ok(Value::Bool(true));
        }
        let state = self.state.lock();
        if state.missing.iter().any(|m| script.contains(m.as_str())) {
            return Err(SurfaceError::Timeout("page function".to_string()));
        }
        Ok(Value::Bool(true))
    }

    async fn dispatch_pointer(&self, sequence: PointerSequence) -> Result<(), SurfaceError> {
        self.touch()?;
        let geometry = Self::geometry();
        let accepted = {
            let mut state = self.state.lock();
            let perspective = state.playing_as.unwrap_or(Color::White);
            let (Some(from), Some(to)) = (
                geometry.locate(sequence.down, perspective),
                geometry.locate(sequence.up, perspective),
            ) else {
                return Ok(());
            };
            state.drags.push((from, to));
            if state.ignored_drags > 0 {
                state.ignored_drags -= 1;
                return Ok(());
            }
            let legal = state
                .legal
                .get(&from)
                .map(|moves| moves.contains(&to))
                .unwrap_or(false);
            if !legal {
                return Ok(());
            }
            let pawn = state
                .pieces
                .iter()
                .find(|p| p.square == from)
                .map(|p| p.kind == PieceKind::Pawn && to.rank() == p.color.promotion_rank())
                .unwrap_or(false);
            if pawn {
                state.pending_promotion = Some((from, to));
                None
            } else {
                Some((from, to))
            }
        };
        if let Some((from, to)) = accepted {
            self.apply(from, to, None);
        }
        Ok(())
    }

    async fn reload(&self) -> Result<(), SurfaceError> {
        self.touch()?;
        let mut state = self.state.lock();
        state.reloads += 1;
        if !state.board_hidden_on_reload.is_zero() {
            state.board_back_at = Some(tokio::time::Instant::now() + state.board_hidden_on_reload);
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), SurfaceError> {
        self.touch()?;
        self.state.lock().closed = true;
        Ok(())
    }
}

#[async_trait]
impl BoardCapability for ScriptedPage {
    async fn playing_color(&self) -> Result<Option<Color>, SurfaceError> {
        self.touch()?;
        Ok(self.state.lock().playing_as)
    }

    async fn plies_played(&self) -> Result<u32, SurfaceError> {
        self.touch()?;
        Ok(self.state.lock().history.len() as u32)
    }

    async fn pieces(&self, color: Color) -> Result<Vec<PieceOnBoard>, SurfaceError> {
        self.touch()?;
        Ok(self
            .state
            .lock()
            .pieces
            .iter()
            .filter(|p| p.color == color)
            .copied()
            .collect())
    }

    async fn legal_moves_for_square(&self, square: Square) -> Result<Vec<Square>, SurfaceError> {
        self.touch()?;
        Ok(self
            .state
            .lock()
            .legal
            .get(&square)
            .cloned()
            .unwrap_or_default())
    }

    async fn history_sans(&self) -> Result<Vec<String>, SurfaceError> {
        self.touch()?;
        Ok(self.state.lock().history.clone())
    }

    async fn is_game_over(&self) -> Result<bool, SurfaceError> {
        self.touch()?;
        Ok(self.state.lock().game_over)
    }

    async fn board_geometry(&self) -> Result<BoardGeometry, SurfaceError> {
        self.touch()?;
        if !self.board_ready() {
            return Err(SurfaceError::Script("board not found".to_string()));
        }
        Ok(Self::geometry())
    }

    async fn subscribe(&self) -> Result<BoardSubscription, SurfaceError> {
        self.touch()?;
        Ok(self.events.subscribe())
    }
}
